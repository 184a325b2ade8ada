//! Plugin parameters and per-file schema options.

use std::collections::HashMap;

use log::debug;
use prost::Message;

use crate::error::{GeneratorError, GeneratorResult};

/// Flags recognised in the protoc parameter string. Anything else is a
/// parameter error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Params {
    /// Emit interop shims against the Java protobuf runtime.
    pub java_conversions: bool,
    /// Drop the per-file package suffix when deriving target packages.
    pub flat_package: bool,
    /// Invoke the external service stub printer for each service.
    pub grpc: bool,
    /// Emit a compact single-line text-format `toString`.
    pub single_line_to_string: bool,
}

impl Params {
    pub fn parse(parameter: &str) -> GeneratorResult<Params> {
        let mut params = Params::default();
        for token in parameter.split(',').map(str::trim) {
            match token {
                "" => (),
                "java_conversions" => params.java_conversions = true,
                "flat_package" => params.flat_package = true,
                "grpc" => params.grpc = true,
                "single_line_to_string" => params.single_line_to_string = true,
                unknown => return Err(GeneratorError::UnknownParameter(unknown.to_string())),
            }
        }
        Ok(params)
    }
}

/// Per-file options carried in the schema's extended `FileOptions`
/// (extension field 1020).
#[derive(Clone, PartialEq, Message)]
pub struct ScalaFileOptions {
    /// Overrides the derived target package.
    #[prost(string, optional, tag = "1")]
    pub package_name: Option<String>,
    /// Per-file override of the `flat_package` plugin flag.
    #[prost(bool, optional, tag = "2")]
    pub flat_package: Option<bool>,
    /// Additional import lines added to every output file.
    #[prost(string, repeated, tag = "3")]
    pub import: Vec<String>,
    /// Verbatim lines placed at the top of the output; requires
    /// `single_file`.
    #[prost(string, repeated, tag = "4")]
    pub preamble: Vec<String>,
    /// Emit all of the file's output into a single `.scala` file.
    #[prost(bool, optional, tag = "5")]
    pub single_file: Option<bool>,
}

/// Per-field options (extension field 1020 of `FieldOptions`).
#[derive(Clone, PartialEq, Message)]
pub struct ScalaFieldOptions {
    /// Fully qualified custom Scala type; its companion must provide the
    /// `toBase` / `toCustom` lift pair.
    #[prost(string, optional, tag = "1")]
    pub custom_type: Option<String>,
}

// `prost_types` drops extension fields it does not know about, so the
// custom options never survive a `CodeGeneratorRequest` decode. The probe
// messages below re-decode the raw request bytes keeping only the paths
// that lead to extension 1020; prost's field skipping ignores the rest.

#[derive(Clone, PartialEq, Message)]
struct RequestProbe {
    #[prost(message, repeated, tag = "15")]
    proto_file: Vec<FileProbe>,
}

#[derive(Clone, PartialEq, Message)]
struct FileProbe {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(string, optional, tag = "2")]
    package: Option<String>,
    #[prost(message, repeated, tag = "4")]
    message_type: Vec<MessageProbe>,
    #[prost(message, optional, tag = "8")]
    options: Option<FileOptionsProbe>,
}

#[derive(Clone, PartialEq, Message)]
struct FileOptionsProbe {
    #[prost(message, optional, tag = "1020")]
    scala: Option<ScalaFileOptions>,
}

#[derive(Clone, PartialEq, Message)]
struct MessageProbe {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    field: Vec<FieldProbe>,
    #[prost(message, repeated, tag = "3")]
    nested_type: Vec<MessageProbe>,
}

#[derive(Clone, PartialEq, Message)]
struct FieldProbe {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(message, optional, tag = "8")]
    options: Option<FieldOptionsProbe>,
}

#[derive(Clone, PartialEq, Message)]
struct FieldOptionsProbe {
    #[prost(message, optional, tag = "1020")]
    scala: Option<ScalaFieldOptions>,
}

/// The harvested schema options: per-file options keyed by file name and
/// per-field custom types keyed by the field's fully qualified proto name
/// (`.package.Message.field`).
#[derive(Debug, Clone, Default)]
pub struct OptionsRegistry {
    file_options: HashMap<String, ScalaFileOptions>,
    field_custom_types: HashMap<String, String>,
}

impl OptionsRegistry {
    /// Harvests options from the raw, undecoded request bytes.
    ///
    /// A request that fails to decode here produced a registry with no
    /// options; the caller's own decode of the full request reports the
    /// malformed input.
    pub fn from_request_bytes(raw: &[u8]) -> OptionsRegistry {
        let probe = match RequestProbe::decode(raw) {
            Ok(probe) => probe,
            Err(_) => return OptionsRegistry::default(),
        };

        let mut registry = OptionsRegistry::default();
        for file in probe.proto_file {
            let package = match file.package.as_deref() {
                Some("") | None => String::new(),
                Some(package) => format!(".{}", package),
            };
            for message in &file.message_type {
                registry.harvest_message(&package, message);
            }
            let file_name = file.name.clone();
            if let Some(options) = file.options.and_then(|options| options.scala) {
                debug!("file options for {:?}: {:?}", file_name, options);
                registry
                    .file_options
                    .insert(file_name.unwrap_or_default(), options);
            }
        }
        registry
    }

    fn harvest_message(&mut self, scope: &str, message: &MessageProbe) {
        let scope = format!("{}.{}", scope, message.name());
        for field in &message.field {
            let custom_type = field
                .options
                .as_ref()
                .and_then(|options| options.scala.as_ref())
                .and_then(|scala| scala.custom_type.clone());
            if let Some(custom_type) = custom_type {
                self.field_custom_types
                    .insert(format!("{}.{}", scope, field.name()), custom_type);
            }
        }
        for nested in &message.nested_type {
            self.harvest_message(&scope, nested);
        }
    }

    /// Registers per-file options directly, overriding anything harvested.
    pub fn with_file_options(mut self, file: &str, options: ScalaFileOptions) -> OptionsRegistry {
        self.file_options.insert(file.to_string(), options);
        self
    }

    pub fn file_options(&self, file: &str) -> Option<&ScalaFileOptions> {
        self.file_options.get(file)
    }

    /// The custom Scala type mapped onto `.package.Message.field`, if any.
    pub fn field_custom_type(&self, fq_field_name: &str) -> Option<&str> {
        self.field_custom_types.get(fq_field_name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        assert_eq!(Params::parse("").unwrap(), Params::default());
        let params = Params::parse("java_conversions,grpc").unwrap();
        assert!(params.java_conversions);
        assert!(params.grpc);
        assert!(!params.flat_package);
        assert!(!params.single_line_to_string);

        let params = Params::parse("flat_package, single_line_to_string").unwrap();
        assert!(params.flat_package);
        assert!(params.single_line_to_string);
    }

    #[test]
    fn test_parse_params_unknown() {
        match Params::parse("java_conversions,bogus") {
            Err(GeneratorError::UnknownParameter(token)) => assert_eq!(token, "bogus"),
            other => panic!("expected UnknownParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_harvest_file_options() {
        let probe = RequestProbe {
            proto_file: vec![FileProbe {
                name: Some("foo.proto".to_string()),
                package: Some("pkg".to_string()),
                message_type: Vec::new(),
                options: Some(FileOptionsProbe {
                    scala: Some(ScalaFileOptions {
                        package_name: Some("com.example".to_string()),
                        flat_package: Some(true),
                        import: vec!["com.example.util._".to_string()],
                        preamble: Vec::new(),
                        single_file: Some(true),
                    }),
                }),
            }],
        };
        let registry = OptionsRegistry::from_request_bytes(&probe.encode_to_vec());
        let options = registry.file_options("foo.proto").unwrap();
        assert_eq!(options.package_name.as_deref(), Some("com.example"));
        assert_eq!(options.flat_package, Some(true));
        assert_eq!(options.single_file, Some(true));
        assert_eq!(options.import, vec!["com.example.util._".to_string()]);
    }

    #[test]
    fn test_harvest_field_custom_type() {
        let probe = RequestProbe {
            proto_file: vec![FileProbe {
                name: Some("foo.proto".to_string()),
                package: Some("pkg".to_string()),
                message_type: vec![MessageProbe {
                    name: Some("Msg".to_string()),
                    field: vec![FieldProbe {
                        name: Some("when".to_string()),
                        options: Some(FieldOptionsProbe {
                            scala: Some(ScalaFieldOptions {
                                custom_type: Some("com.example.Instant".to_string()),
                            }),
                        }),
                    }],
                    nested_type: vec![MessageProbe {
                        name: Some("Inner".to_string()),
                        field: vec![FieldProbe {
                            name: Some("plain".to_string()),
                            options: None,
                        }],
                        nested_type: Vec::new(),
                    }],
                }],
                options: None,
            }],
        };
        let registry = OptionsRegistry::from_request_bytes(&probe.encode_to_vec());
        assert_eq!(
            registry.field_custom_type(".pkg.Msg.when"),
            Some("com.example.Instant")
        );
        assert_eq!(registry.field_custom_type(".pkg.Msg.Inner.plain"), None);
    }

    #[test]
    fn test_garbage_bytes_yield_empty_registry() {
        let registry = OptionsRegistry::from_request_bytes(&[0xff, 0xff, 0xff]);
        assert!(registry.file_options("anything").is_none());
    }
}
