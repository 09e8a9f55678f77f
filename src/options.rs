//! Monitor options and their schema
//!
//! Every option the monitor understands is listed once in [SCHEMA], together
//! with its type, its built-in default, and whether it is handed to the
//! session launcher through a dedicated channel rather than as a generic
//! token. The merger and the argument vector adapter both consult this table,
//! so the two can never disagree about defaults.
//!
//! The declaration order of [OptionKey] is the order in which options are
//! emitted as tokens.

use std::{collections::BTreeMap, path::Path};

use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// A recognised monitor option
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum OptionKey {
    Port,
    Baud,
    Parity,
    Rtscts,
    Xonxoff,
    Rts,
    Dtr,
    Echo,
    Encoding,
    Filter,
    Eol,
    Raw,
    ExitChar,
    MenuChar,
    Quiet,
    ProjectDir,
    Environment,
}

impl OptionKey {
    /// The schema entry of this option
    pub fn spec(self) -> &'static OptionSpec {
        &SCHEMA[self as usize]
    }

    /// Command-line form of the option, e.g. `--exit-char`
    pub fn flag(self) -> String {
        let name: &'static str = self.into();
        format!("--{}", name.replace('_', "-"))
    }

    /// Options passed to the session launcher through their own channel
    pub fn side_channel_keys() -> Vec<OptionKey> {
        OptionKey::iter()
            .filter(|key| key.spec().side_channel)
            .collect()
    }
}

/// Value type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean switch, forwarded as a bare `--key`
    Flag,
    Integer,
    Text,
    /// Text restricted to the listed values
    Choice(&'static [&'static str]),
    /// Repeatable option, forwarded as `--key value` per element
    List,
}

impl OptionKind {
    /// Whether `value` is of this kind; [OptionValue::Unset] fits every kind
    pub fn accepts(self, value: &OptionValue) -> bool {
        match (self, value) {
            (_, OptionValue::Unset)
            | (OptionKind::Flag, OptionValue::Flag(_))
            | (OptionKind::Integer, OptionValue::Integer(_))
            | (OptionKind::Text, OptionValue::Text(_))
            | (OptionKind::List, OptionValue::List(_)) => true,
            (OptionKind::Choice(choices), OptionValue::Text(text)) => {
                choices.contains(&text.as_str())
            }
            _ => false,
        }
    }
}

/// Built-in default of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// No default; the option stays unset unless supplied
    Unset,
    Flag(bool),
    Integer(i64),
    Text(&'static str),
    EmptyList,
}

impl DefaultValue {
    pub fn to_value(self) -> OptionValue {
        match self {
            DefaultValue::Unset => OptionValue::Unset,
            DefaultValue::Flag(flag) => OptionValue::Flag(flag),
            DefaultValue::Integer(int) => OptionValue::Integer(int),
            DefaultValue::Text(text) => OptionValue::Text(text.to_string()),
            DefaultValue::EmptyList => OptionValue::List(Vec::new()),
        }
    }
}

/// A row of the option schema
#[derive(Debug)]
pub struct OptionSpec {
    pub key: OptionKey,
    pub kind: OptionKind,
    pub default: DefaultValue,
    /// Consumed by the launcher directly; never forwarded as a generic token
    pub side_channel: bool,
}

pub const PARITY_CHOICES: &[&str] = &["N", "E", "O", "S", "M"];
pub const EOL_CHOICES: &[&str] = &["CR", "LF", "CRLF"];
pub const LINE_STATE_CHOICES: &[&str] = &["0", "1"];

pub const DEFAULT_BAUD: u32 = 9600;

const fn spec(
    key: OptionKey,
    kind: OptionKind,
    default: DefaultValue,
    side_channel: bool,
) -> OptionSpec {
    OptionSpec {
        key,
        kind,
        default,
        side_channel,
    }
}

/// The option schema, indexed by [OptionKey]
pub static SCHEMA: [OptionSpec; OptionKey::COUNT] = {
    use DefaultValue as D;
    use OptionKey as K;
    use OptionKind as T;

    [
        spec(K::Port, T::Text, D::Unset, true),
        spec(K::Baud, T::Integer, D::Integer(DEFAULT_BAUD as i64), true),
        spec(K::Parity, T::Choice(PARITY_CHOICES), D::Text("N"), false),
        spec(K::Rtscts, T::Flag, D::Flag(false), false),
        spec(K::Xonxoff, T::Flag, D::Flag(false), false),
        spec(K::Rts, T::Choice(LINE_STATE_CHOICES), D::Unset, true),
        spec(K::Dtr, T::Choice(LINE_STATE_CHOICES), D::Unset, true),
        spec(K::Echo, T::Flag, D::Flag(false), false),
        spec(K::Encoding, T::Text, D::Text("UTF-8"), false),
        spec(K::Filter, T::List, D::EmptyList, false),
        spec(K::Eol, T::Choice(EOL_CHOICES), D::Text("CRLF"), false),
        spec(K::Raw, T::Flag, D::Flag(false), false),
        spec(K::ExitChar, T::Integer, D::Integer(3), false),
        spec(K::MenuChar, T::Integer, D::Integer(20), false),
        spec(K::Quiet, T::Flag, D::Flag(false), false),
        spec(K::ProjectDir, T::Text, D::Text("."), true),
        spec(K::Environment, T::Text, D::Unset, true),
    ]
};

/// Parity checking mode
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum Parity {
    #[strum(to_string = "N")]
    #[cfg_attr(feature = "cli", value(name = "N"))]
    None,
    #[strum(to_string = "E")]
    #[cfg_attr(feature = "cli", value(name = "E"))]
    Even,
    #[strum(to_string = "O")]
    #[cfg_attr(feature = "cli", value(name = "O"))]
    Odd,
    #[strum(to_string = "S")]
    #[cfg_attr(feature = "cli", value(name = "S"))]
    Space,
    #[strum(to_string = "M")]
    #[cfg_attr(feature = "cli", value(name = "M"))]
    Mark,
}

/// End of line sequence sent for the Enter key
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum Eol {
    #[strum(to_string = "CR")]
    #[cfg_attr(feature = "cli", value(name = "CR"))]
    Cr,
    #[strum(to_string = "LF")]
    #[cfg_attr(feature = "cli", value(name = "LF"))]
    Lf,
    #[strum(to_string = "CRLF")]
    #[cfg_attr(feature = "cli", value(name = "CRLF"))]
    Crlf,
}

/// The value of an option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Unset,
    Flag(bool),
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl OptionValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, OptionValue::Unset)
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            OptionValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            OptionValue::Integer(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(list) => Some(list),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(flag: bool) -> Self {
        OptionValue::Flag(flag)
    }
}

impl From<i64> for OptionValue {
    fn from(int: i64) -> Self {
        OptionValue::Integer(int)
    }
}

impl From<u32> for OptionValue {
    fn from(int: u32) -> Self {
        OptionValue::Integer(int.into())
    }
}

impl From<u8> for OptionValue {
    fn from(int: u8) -> Self {
        OptionValue::Integer(int.into())
    }
}

impl From<&str> for OptionValue {
    fn from(text: &str) -> Self {
        OptionValue::Text(text.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(text: String) -> Self {
        OptionValue::Text(text)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(list: Vec<String>) -> Self {
        OptionValue::List(list)
    }
}

/// Where a merged value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Not supplied anywhere and the option has no default
    Unset,
    /// Built-in default from the schema
    Default,
    /// Project file, for the active environment
    Project,
    /// Passed on the command line by the user
    Explicit,
}

/// A merged option value and its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub value: OptionValue,
    pub origin: Origin,
}

/// Options the user passed explicitly on the command line
///
/// Options left at their command-line default are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptionSet {
    values: BTreeMap<OptionKey, OptionValue>,
}

impl RawOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explicitly supplied value; [OptionValue::Unset] removes it.
    pub fn set(&mut self, key: OptionKey, value: impl Into<OptionValue>) -> &mut Self {
        match value.into() {
            OptionValue::Unset => self.values.remove(&key),
            value => self.values.insert(key, value),
        };
        self
    }

    pub fn with(mut self, key: OptionKey, value: impl Into<OptionValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: OptionKey) -> Option<&OptionValue> {
        self.values.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The fully resolved configuration of one monitor invocation
///
/// Holds a [Setting] for every [OptionKey]; it is only built by
/// [merge()](crate::merge()) and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedOptionSet {
    settings: Vec<Setting>,
    project_context: bool,
}

impl MergedOptionSet {
    pub(crate) fn new(settings: Vec<Setting>, project_context: bool) -> Self {
        debug_assert_eq!(settings.len(), OptionKey::COUNT);
        MergedOptionSet {
            settings,
            project_context,
        }
    }

    pub fn setting(&self, key: OptionKey) -> &Setting {
        &self.settings[key as usize]
    }

    pub fn get(&self, key: OptionKey) -> &OptionValue {
        &self.setting(key).value
    }

    pub fn origin(&self, key: OptionKey) -> Origin {
        self.setting(key).origin
    }

    /// All settings, in key order
    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &Setting)> {
        OptionKey::iter().zip(self.settings.iter())
    }

    /// Whether project options took part in the merge
    pub fn has_project_context(&self) -> bool {
        self.project_context
    }

    /// Requested port, if any; an empty string counts as none
    pub fn port(&self) -> Option<&str> {
        self.get(OptionKey::Port)
            .as_text()
            .filter(|port| !port.is_empty())
    }

    pub fn baud(&self) -> u32 {
        self.get(OptionKey::Baud)
            .as_integer()
            .and_then(|baud| u32::try_from(baud).ok())
            .unwrap_or(DEFAULT_BAUD)
    }

    pub fn rts(&self) -> Option<u8> {
        self.line_state(OptionKey::Rts)
    }

    pub fn dtr(&self) -> Option<u8> {
        self.line_state(OptionKey::Dtr)
    }

    fn line_state(&self, key: OptionKey) -> Option<u8> {
        self.get(key).as_text().and_then(|state| state.parse().ok())
    }

    pub fn quiet(&self) -> bool {
        self.get(OptionKey::Quiet).as_flag().unwrap_or_default()
    }

    pub fn project_dir(&self) -> &Path {
        Path::new(self.get(OptionKey::ProjectDir).as_text().unwrap_or("."))
    }

    pub fn environment(&self) -> Option<&str> {
        self.get(OptionKey::Environment).as_text()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn schema_is_indexed_by_key() {
        for key in OptionKey::iter() {
            assert_eq!(key.spec().key, key);
            assert!(key.spec().kind.accepts(&key.spec().default.to_value()));
        }
    }

    #[test]
    fn flag_names() {
        assert_eq!(OptionKey::Port.flag(), "--port");
        assert_eq!(OptionKey::ExitChar.flag(), "--exit-char");
        assert_eq!(OptionKey::ProjectDir.flag(), "--project-dir");
        assert_eq!("menu_char".parse::<OptionKey>().unwrap(), OptionKey::MenuChar);
    }

    #[test]
    fn side_channel_keys() {
        assert_eq!(
            OptionKey::side_channel_keys(),
            vec![
                OptionKey::Port,
                OptionKey::Baud,
                OptionKey::Rts,
                OptionKey::Dtr,
                OptionKey::ProjectDir,
                OptionKey::Environment,
            ]
        );
    }

    #[test]
    fn choices_match_enums() {
        let parity = Parity::iter().map(|p| p.to_string()).collect::<Vec<_>>();
        assert_eq!(parity, PARITY_CHOICES);

        let eol = Eol::iter().map(|e| e.to_string()).collect::<Vec<_>>();
        assert_eq!(eol, EOL_CHOICES);
    }

    #[test]
    fn kind_accepts() {
        assert!(OptionKind::Choice(PARITY_CHOICES).accepts(&"E".into()));
        assert!(!OptionKind::Choice(PARITY_CHOICES).accepts(&"X".into()));
        assert!(!OptionKind::Flag.accepts(&OptionValue::Integer(1)));
        assert!(OptionKind::List.accepts(&OptionValue::Unset));
    }

    #[test]
    fn raw_set_unset_removes() {
        let mut raw = RawOptionSet::new().with(OptionKey::Echo, true);
        assert_eq!(raw.get(OptionKey::Echo), Some(&OptionValue::Flag(true)));

        raw.set(OptionKey::Echo, OptionValue::Unset);
        assert!(raw.is_empty());
    }
}
