//! Combining command-line and project options

use log::debug;
use strum::IntoEnumIterator;

use crate::{
    options::{MergedOptionSet, OptionKey, Origin, RawOptionSet, Setting},
    project::ProjectOptions,
};

/// Merge explicitly supplied command-line options with the options of the
/// active project environment.
///
/// For every [OptionKey] the value is taken from, in order of precedence:
///
/// 1. the command line, if the user passed the option,
/// 2. the project environment,
/// 3. the built-in default from the schema.
///
/// Passing `None` for `project` means there is no project context; the
/// result then reports [MergedOptionSet::has_project_context] as `false`.
pub fn merge(cli: &RawOptionSet, project: Option<&ProjectOptions>) -> MergedOptionSet {
    let settings = OptionKey::iter()
        .map(|key| {
            let setting = if let Some(value) = cli.get(key) {
                Setting {
                    value: value.clone(),
                    origin: Origin::Explicit,
                }
            } else if let Some(value) = project.and_then(|project| project.get(key)) {
                Setting {
                    value: value.clone(),
                    origin: Origin::Project,
                }
            } else {
                let value = key.spec().default.to_value();
                let origin = if value.is_unset() {
                    Origin::Unset
                } else {
                    Origin::Default
                };

                Setting { value, origin }
            };

            if matches!(setting.origin, Origin::Explicit | Origin::Project) {
                debug!("{key} = {:?} ({:?})", setting.value, setting.origin);
            }

            setting
        })
        .collect();

    MergedOptionSet::new(settings, project.is_some())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::options::OptionValue;

    fn project() -> ProjectOptions {
        ProjectOptions::new("uno")
            .with_option(OptionKey::Baud, 115_200u32)
            .with_option(OptionKey::Port, "/dev/ttyUSB*")
            .with_option(OptionKey::Echo, true)
    }

    #[test]
    fn defaults_only() {
        let merged = merge(&RawOptionSet::new(), None);

        for key in OptionKey::iter() {
            assert_eq!(merged.get(key), &key.spec().default.to_value());
        }
        assert_eq!(merged.origin(OptionKey::Port), Origin::Unset);
        assert_eq!(merged.origin(OptionKey::Baud), Origin::Default);
        assert_eq!(merged.baud(), 9600);
        assert_eq!(merged.port(), None);
        assert!(!merged.has_project_context());
    }

    #[test]
    fn every_key_is_defined() {
        let merged = merge(&RawOptionSet::new().with(OptionKey::Raw, true), Some(&project()));

        assert_eq!(merged.iter().count(), OptionKey::iter().count());
        assert!(merged.has_project_context());
    }

    #[test]
    fn project_overrides_defaults() {
        let merged = merge(&RawOptionSet::new(), Some(&project()));

        assert_eq!(merged.baud(), 115_200);
        assert_eq!(merged.origin(OptionKey::Baud), Origin::Project);
        assert_eq!(merged.port(), Some("/dev/ttyUSB*"));
        assert_eq!(merged.get(OptionKey::Echo), &OptionValue::Flag(true));
        assert_eq!(merged.origin(OptionKey::Parity), Origin::Default);
    }

    #[test]
    fn explicit_cli_wins() {
        let cli = RawOptionSet::new()
            .with(OptionKey::Baud, 57_600u32)
            .with(OptionKey::Port, "COM3");
        let merged = merge(&cli, Some(&project()));

        assert_eq!(merged.baud(), 57_600);
        assert_eq!(merged.origin(OptionKey::Baud), Origin::Explicit);
        assert_eq!(merged.port(), Some("COM3"));
    }

    #[test]
    fn explicit_default_value_is_still_explicit() {
        let cli = RawOptionSet::new().with(OptionKey::Baud, 9600u32);
        let merged = merge(&cli, Some(&project()));

        assert_eq!(merged.baud(), 9600);
        assert_eq!(merged.origin(OptionKey::Baud), Origin::Explicit);
    }

    #[test]
    fn explicit_falsy_value_wins() {
        let cli = RawOptionSet::new().with(OptionKey::Rts, "0");
        let project = ProjectOptions::new("uno").with_option(OptionKey::Rts, "1");
        let merged = merge(&cli, Some(&project));

        assert_eq!(merged.rts(), Some(0));
    }

    #[test]
    fn merge_is_deterministic() {
        let cli = RawOptionSet::new().with(OptionKey::Echo, true);
        assert_eq!(merge(&cli, Some(&project())), merge(&cli, Some(&project())));
    }
}
