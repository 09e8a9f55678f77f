//! Flattening merged options into the terminal engine's argument vector

use crate::{
    options::{MergedOptionSet, OptionKey, OptionValue, Origin},
    project::ProjectOptions,
};

/// Serialize `merged` into command-line tokens for the terminal engine.
///
/// Raw flags from the project (`monitor_flags`) come first, verbatim. Then,
/// in [OptionKey] order and skipping `exclude`:
///
/// - flags produce `--key` when set, and nothing otherwise;
/// - valued options produce `--key value` when the value was passed
///   explicitly, comes from the project, or differs from the default;
/// - list options produce one `--key value` pair per element.
///
/// An option whose `--key` form already appears among the project's raw
/// flags is not emitted a second time.
pub fn to_tokens(
    merged: &MergedOptionSet,
    project: Option<&ProjectOptions>,
    exclude: &[OptionKey],
) -> Vec<String> {
    let raw_flags = project.map(ProjectOptions::extra_flags).unwrap_or_default();
    let mut tokens = raw_flags.to_vec();

    for (key, setting) in merged.iter() {
        if exclude.contains(&key) {
            continue;
        }

        let flag = key.flag();
        if raw_flags.contains(&flag) {
            continue;
        }

        let from_project = project.is_some_and(|project| project.contains(key));
        let forced = from_project || setting.origin == Origin::Explicit;
        let is_default = setting.value == key.spec().default.to_value();

        match &setting.value {
            OptionValue::Unset => {}
            OptionValue::Flag(set) => {
                if *set {
                    tokens.push(flag);
                }
            }
            OptionValue::List(values) => {
                for value in values {
                    tokens.push(flag.clone());
                    tokens.push(value.clone());
                }
            }
            OptionValue::Integer(_) | OptionValue::Text(_) if !forced && is_default => {}
            OptionValue::Integer(int) => {
                tokens.push(flag);
                tokens.push(int.to_string());
            }
            OptionValue::Text(text) => {
                tokens.push(flag);
                tokens.push(text.clone());
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{merge, options::RawOptionSet};

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn defaults_produce_nothing() {
        let merged = merge(&RawOptionSet::new(), None);
        assert_eq!(to_tokens(&merged, None, &[]), Vec::<String>::new());
    }

    #[test]
    fn flags_and_exclusions() {
        let cli = RawOptionSet::new()
            .with(OptionKey::Baud, 115_200u32)
            .with(OptionKey::Echo, true)
            .with(OptionKey::Raw, false);
        let merged = merge(&cli, None);

        let tokens = to_tokens(&merged, None, &[OptionKey::Port, OptionKey::Baud]);

        assert_eq!(tokens, vec!["--echo".to_string()]);
    }

    #[test]
    fn valued_options_differing_from_default() {
        let cli = RawOptionSet::new()
            .with(OptionKey::Parity, "E")
            .with(OptionKey::ExitChar, 29u8)
            .with(OptionKey::Encoding, "Latin1");
        let merged = merge(&cli, None);

        assert_eq!(
            to_tokens(&merged, None, &OptionKey::side_channel_keys()),
            tokens(&["--parity", "E", "--encoding", "Latin1", "--exit-char", "29"])
        );
    }

    #[test]
    fn explicit_default_is_forwarded() {
        let cli = RawOptionSet::new().with(OptionKey::Eol, "CRLF");
        let merged = merge(&cli, None);

        assert_eq!(
            to_tokens(&merged, None, &OptionKey::side_channel_keys()),
            tokens(&["--eol", "CRLF"])
        );
    }

    #[test]
    fn project_values_are_always_forwarded() {
        let project = ProjectOptions::new("uno")
            .with_option(OptionKey::MenuChar, 20u8)
            .with_option(OptionKey::Baud, 9600u32);
        let merged = merge(&RawOptionSet::new(), Some(&project));

        assert_eq!(
            to_tokens(&merged, Some(&project), &[OptionKey::Port]),
            tokens(&["--baud", "9600", "--menu-char", "20"])
        );
    }

    #[test]
    fn filters_repeat() {
        let cli = RawOptionSet::new().with(
            OptionKey::Filter,
            vec!["time".to_string(), "colorize".to_string()],
        );
        let merged = merge(&cli, None);

        assert_eq!(
            to_tokens(&merged, None, &OptionKey::side_channel_keys()),
            tokens(&["--filter", "time", "--filter", "colorize"])
        );
    }

    #[test]
    fn raw_project_flags_come_first_and_are_not_repeated() {
        let project = ProjectOptions::new("uno")
            .with_extra_flags(tokens(&["--echo", "--encoding", "hexlify"]));
        let cli = RawOptionSet::new()
            .with(OptionKey::Echo, true)
            .with(OptionKey::Encoding, "Latin1")
            .with(OptionKey::Quiet, true);
        let merged = merge(&cli, Some(&project));

        assert_eq!(
            to_tokens(&merged, Some(&project), &OptionKey::side_channel_keys()),
            tokens(&["--echo", "--encoding", "hexlify", "--quiet"])
        );
    }

    #[test]
    fn unset_options_are_skipped() {
        let merged = merge(&RawOptionSet::new(), None);

        let tokens = to_tokens(&merged, None, &[]);

        assert!(!tokens.contains(&"--port".to_string()));
        assert!(!tokens.contains(&"--rts".to_string()));
        assert!(tokens.is_empty());
    }

    #[test]
    fn order_is_stable() {
        let cli = RawOptionSet::new()
            .with(OptionKey::Quiet, true)
            .with(OptionKey::Rtscts, true)
            .with(OptionKey::Xonxoff, true);
        let merged = merge(&cli, None);

        let first = to_tokens(&merged, None, &[]);
        assert_eq!(first, tokens(&["--rtscts", "--xonxoff", "--quiet"]));
        assert_eq!(first, to_tokens(&merged, None, &[]));
    }
}
