//! Derivation of the emba command-line flags from an analysis.
//!
//! The mapping is a fixed, ordered rule table. Order and spelling of the
//! flags are consumed by emba as-is and must not change.

use crate::sanitize::{list_repr, Sanitizer};
use crate::types::FlagSource;

/// Module id of the cwe-checker; emba needs `-c` right after it.
pub const CWE_CHECKER_MODULE: &str = "s120";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Version,
    DeviceNames,
    VendorNames,
    Notes,
    Architecture,
    UserEmulation,
    SystemEmulation,
    ScanModules,
}

#[derive(Debug, Clone, Copy)]
enum Template {
    /// `<flag> "<sanitized>"`
    Quoted(Sanitizer),
    /// `<flag> "<sanitized list repr>"`
    QuotedList(Sanitizer),
    /// `<flag> "<sanitized> (uuid:<id>)"`
    QuotedWithId(Sanitizer),
    /// `<flag> <value>`
    Verbatim,
    /// `<flag>` when set
    Switch,
    /// `<flag> <module>` per module, plus `-c` after the cwe-checker
    PerModule,
}

struct FlagRule {
    field: Field,
    flag: &'static str,
    template: Template,
}

const FLAG_TABLE: [FlagRule; 8] = [
    FlagRule {
        field: Field::Version,
        flag: "-X",
        template: Template::Quoted(Sanitizer::Version),
    },
    FlagRule {
        field: Field::DeviceNames,
        flag: "-Z",
        template: Template::QuotedList(Sanitizer::NameList),
    },
    FlagRule {
        field: Field::VendorNames,
        flag: "-Y",
        template: Template::QuotedList(Sanitizer::NameList),
    },
    FlagRule {
        field: Field::Notes,
        flag: "-N",
        template: Template::QuotedWithId(Sanitizer::Notes),
    },
    FlagRule {
        field: Field::Architecture,
        flag: "-a",
        template: Template::Verbatim,
    },
    FlagRule {
        field: Field::UserEmulation,
        flag: "-E",
        template: Template::Switch,
    },
    FlagRule {
        field: Field::SystemEmulation,
        flag: "-Q",
        template: Template::Switch,
    },
    FlagRule {
        field: Field::ScanModules,
        flag: "-m",
        template: Template::PerModule,
    },
];

enum FieldValue<'a> {
    Text(&'a str),
    List(Vec<&'a str>),
    Switch(bool),
}

impl FlagSource {
    fn field(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Version => FieldValue::Text(&self.version),
            Field::Notes => FieldValue::Text(&self.notes),
            Field::Architecture => {
                FieldValue::Text(self.architecture.map(|a| a.as_str()).unwrap_or(""))
            }
            Field::DeviceNames => {
                FieldValue::List(self.devices.iter().map(|d| d.name.as_str()).collect())
            }
            Field::VendorNames => FieldValue::List(
                self.devices
                    .iter()
                    .map(|d| d.vendor.as_deref().unwrap_or(""))
                    .collect(),
            ),
            Field::UserEmulation => FieldValue::Switch(self.user_emulation_test),
            Field::SystemEmulation => FieldValue::Switch(self.system_emulation_test),
            Field::ScanModules => {
                FieldValue::List(self.scan_modules.iter().map(String::as_str).collect())
            }
        }
    }
}

impl FlagRule {
    fn render(&self, source: &FlagSource, segments: &mut Vec<String>) {
        let value = source.field(self.field);
        match (self.template, value) {
            (Template::Quoted(sanitizer), FieldValue::Text(text)) if !text.is_empty() => {
                segments.push(format!("{} \"{}\"", self.flag, sanitizer.apply(text)));
            }
            (Template::QuotedList(sanitizer), FieldValue::List(items)) if !items.is_empty() => {
                segments.push(format!(
                    "{} \"{}\"",
                    self.flag,
                    sanitizer.apply(&list_repr(items.as_slice()))
                ));
            }
            (Template::QuotedWithId(sanitizer), FieldValue::Text(text)) if !text.is_empty() => {
                segments.push(format!(
                    "{} \"{} (uuid:{})\"",
                    self.flag,
                    sanitizer.apply(text),
                    source.analysis_id
                ));
            }
            (Template::Verbatim, FieldValue::Text(text)) if !text.is_empty() => {
                segments.push(format!("{} {}", self.flag, text));
            }
            (Template::Switch, FieldValue::Switch(true)) => {
                segments.push(self.flag.to_string());
            }
            (Template::PerModule, FieldValue::List(modules)) => {
                for module in modules {
                    segments.push(format!("{} {}", self.flag, module));
                    if module == CWE_CHECKER_MODULE {
                        segments.push("-c".to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

/// Builds the emba flag string for an analysis.
///
/// Segments are separated by single spaces. Empty, false and absent fields
/// contribute nothing, so an analysis without options yields an empty string.
pub fn derive_flags(source: &FlagSource) -> String {
    let mut segments = Vec::new();
    for rule in FLAG_TABLE.iter() {
        rule.render(source, &mut segments);
    }

    let command = segments.join(" ");
    tracing::info!(analysis_id = %source.analysis_id, "final emba parameters: {}", command);
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Architecture, DeviceTag};
    use uuid::Uuid;

    fn source() -> FlagSource {
        FlagSource {
            analysis_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            ..FlagSource::default()
        }
    }

    #[test]
    fn test_empty_source_yields_empty_string() {
        assert_eq!(derive_flags(&source()), "");
    }

    #[test]
    fn test_version_is_sanitized() {
        let flags = derive_flags(&FlagSource {
            version: "1.0; rm -rf".to_string(),
            ..source()
        });
        assert_eq!(flags, "-X \"1.0rm-rf\"");
    }

    #[test]
    fn test_version_with_only_disallowed_characters_still_emits_flag() {
        let flags = derive_flags(&FlagSource {
            version: "\";`".to_string(),
            ..source()
        });
        assert_eq!(flags, "-X \"\"");
    }

    #[test]
    fn test_devices_emit_name_and_vendor_lists() {
        let flags = derive_flags(&FlagSource {
            devices: vec![
                DeviceTag::new("Fritz!Box 7590", Some("AVM GmbH".to_string())),
                DeviceTag::new("wrt_54g", Some("Link-sys".to_string())),
            ],
            ..source()
        });
        assert_eq!(flags, "-Z \"FritzBox7590wrt_54g\" -Y \"AVMGmbHLink-sys\"");
    }

    #[test]
    fn test_device_without_vendor_contributes_empty_vendor() {
        let flags = derive_flags(&FlagSource {
            devices: vec![DeviceTag::new("cam", None)],
            ..source()
        });
        assert_eq!(flags, "-Z \"cam\" -Y \"\"");
    }

    #[test]
    fn test_invisible_device_characters_leave_escape_letters() {
        let flags = derive_flags(&FlagSource {
            devices: vec![DeviceTag::new("a\u{ad}b", Some("z\u{200b}".to_string()))],
            ..source()
        });
        assert_eq!(flags, "-Z \"axadb\" -Y \"zu200b\"");
    }

    #[test]
    fn test_notes_carry_analysis_id() {
        let flags = derive_flags(&FlagSource {
            notes: "nightly run; \"$HOME\"".to_string(),
            ..source()
        });
        assert_eq!(
            flags,
            "-N \"nightly run HOME (uuid:550e8400-e29b-41d4-a716-446655440000)\""
        );
    }

    #[test]
    fn test_switches_and_architecture() {
        let flags = derive_flags(&FlagSource {
            architecture: Some(Architecture::Mips64N32),
            user_emulation_test: true,
            system_emulation_test: true,
            ..source()
        });
        assert_eq!(flags, "-a MIPS64_N32 -E -Q");
    }

    #[test]
    fn test_cwe_checker_module_is_followed_by_c() {
        let flags = derive_flags(&FlagSource {
            scan_modules: vec!["s05".to_string(), "s120".to_string()],
            ..source()
        });
        assert_eq!(flags, "-m s05 -m s120 -c");
    }

    #[test]
    fn test_full_ordering() {
        let flags = derive_flags(&FlagSource {
            version: "2.0".to_string(),
            notes: "n".to_string(),
            devices: vec![DeviceTag::new("d", Some("v".to_string()))],
            architecture: Some(Architecture::Arm),
            user_emulation_test: true,
            system_emulation_test: false,
            scan_modules: vec!["s120".to_string(), "f50".to_string()],
            ..source()
        });
        assert_eq!(
            flags,
            "-X \"2.0\" -Z \"d\" -Y \"v\" -N \"n (uuid:550e8400-e29b-41d4-a716-446655440000)\" \
             -a ARM -E -m s120 -c -m f50"
        );
    }
}
