#![doc(html_root_url = "https://docs.rs/protoc-gen-scala/0.1.0")]

//! `protoc-gen-scala` translates protobuf descriptors into Scala source.
//!
//! The crate is the translation engine of a protoc plugin: it consumes a
//! `CodeGeneratorRequest` and produces a `CodeGeneratorResponse` whose files
//! contain immutable Scala case classes with protobuf wire-format
//! serialization, sealed sum types for enums (preserving unknown values)
//! and oneofs, companion objects carrying the embedded file descriptor, and
//! optional interop shims against the Java protobuf runtime.
//!
//! ## Plugin usage
//!
//! ```bash
//! protoc --plugin=protoc-gen-scala --scala_out=OUT_DIR items.proto
//! ```
//!
//! Parameters are passed the protoc way, comma-separated:
//!
//! ```bash
//! protoc --scala_out=java_conversions,flat_package:OUT_DIR items.proto
//! ```
//!
//! The generator recognises exactly `java_conversions`, `flat_package`,
//! `grpc` and `single_line_to_string`; anything else fails the request.
//!
//! Generation is a pure function of the request: no I/O happens here, and
//! on any domain error the response carries the error string and no files.

mod ast;
mod code_generator;
mod descriptor;
mod error;
mod expr;
mod file_graph;
mod ident;
mod options;
mod printer;
mod syntax;

use std::collections::HashMap;

use log::debug;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::FileDescriptorProto;

pub use ast::{Comments, Method, Service};
pub use error::{GeneratorError, GeneratorResult};
pub use options::{OptionsRegistry, Params, ScalaFieldOptions, ScalaFileOptions};

use code_generator::CodeGenerator;
use descriptor::TypeRegistry;
use file_graph::FileGraph;

/// The external service stub printer, invoked once per service descriptor
/// when the `grpc` parameter is set.
pub trait ServiceGenerator {
    fn generate(&self, service: Service, buf: &mut String);
}

/// Configuration options for Scala code generation.
#[derive(Default)]
pub struct Config {
    service_generator: Option<Box<dyn ServiceGenerator>>,
}

impl Config {
    /// Creates a new code generator configuration with default options.
    pub fn new() -> Config {
        Config::default()
    }

    /// Configures the code generator to use the provided service generator.
    pub fn service_generator(&mut self, service_generator: Box<dyn ServiceGenerator>) -> &mut Self {
        self.service_generator = Some(service_generator);
        self
    }

    /// Runs one full plugin invocation: request in, response out.
    ///
    /// Every error channel ends up in the response's `error` string; the
    /// response never carries files alongside an error.
    pub fn run_plugin(
        &mut self,
        request: CodeGeneratorRequest,
        options: OptionsRegistry,
    ) -> CodeGeneratorResponse {
        match self.generate(&request, options) {
            Ok(files) => CodeGeneratorResponse {
                file: files,
                supported_features: Some(Feature::Proto3Optional as u64),
                ..Default::default()
            },
            Err(error) => CodeGeneratorResponse {
                error: Some(error.to_string()),
                ..Default::default()
            },
        }
    }

    fn generate(
        &mut self,
        request: &CodeGeneratorRequest,
        options: OptionsRegistry,
    ) -> GeneratorResult<Vec<File>> {
        let params = Params::parse(request.parameter())?;

        // Fold the request's files into a linked map; protoc sends
        // dependencies before dependents, and the graph rejects requests
        // where that does not hold.
        let graph = FileGraph::new(request.proto_file.iter())?;
        let mut files_by_name: HashMap<&str, &FileDescriptorProto> = HashMap::new();
        for file in &request.proto_file {
            files_by_name.insert(file.name(), file);
        }

        let registry = TypeRegistry::new(&request.proto_file, params.flat_package, options);

        let mut outputs = Vec::new();
        for file_name in &request.file_to_generate {
            if !graph.contains(file_name) {
                return Err(GeneratorError::UnknownFile(file_name.clone()));
            }
            let file = files_by_name[file_name.as_str()];
            debug!("generating: {:?}", file_name);

            let mut generator = CodeGenerator::new(&registry, params, file);
            let generated = generator.generate_file(file, self.service_generator.as_deref())?;
            outputs.extend(generated.into_iter().map(|output| File {
                name: Some(output.name),
                content: Some(output.content),
                ..Default::default()
            }));
        }
        Ok(outputs)
    }
}
