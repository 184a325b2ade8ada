use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prost::Message;
use prost_types::FileDescriptorProto;

use super::*;
use crate::descriptor::{JAVA_RUNTIME, RUNTIME};
use crate::error::{GeneratorError, GeneratorResult};
use crate::ident::{file_object_name, to_upper_camel};
use crate::ServiceGenerator;

/// Base64 chunks stay comfortably under the JVM string-literal limit.
const BASE64_CHUNK: usize = 55_000;

/// One `(name, content)` pair of the response.
pub struct OutputFile {
    pub name: String,
    pub content: String,
}

impl CodeGenerator<'_> {
    /// Emits every output file derived from one schema file: the message
    /// and enum sources, the per-file companion with the embedded
    /// descriptor, and the service stubs when requested.
    pub fn generate_file(
        &mut self,
        file: &FileDescriptorProto,
        service_generator: Option<&dyn ServiceGenerator>,
    ) -> GeneratorResult<Vec<OutputFile>> {
        let ctx = self.file_ctx.clone();
        if !ctx.preamble.is_empty() && !ctx.single_file {
            return Err(GeneratorError::PreambleRequiresSingleFile(ctx.name.clone()));
        }
        check_no_group_fields(&self.proto_scope, file.extension.iter())?;

        let dir = if ctx.target_package.is_empty() {
            String::new()
        } else {
            format!("{}/", ctx.target_package.replace('.', "/"))
        };

        let mut outputs = Vec::new();
        let proto_scope = self.proto_scope.clone();

        let mut service_bufs: Vec<(String, String)> = Vec::new();
        if self.params.grpc {
            if let Some(generator) = service_generator {
                self.push_path(FileDescriptorProtoLocations::SERVICE);
                for (idx, service) in file.service.iter().enumerate() {
                    self.push_path(idx as i32);
                    let resolved = self.resolve_service(service);
                    let name = resolved.name.clone();
                    let mut buf = String::new();
                    generator.generate(resolved, &mut buf);
                    service_bufs.push((name, buf));
                    self.pop_path();
                }
                self.pop_path();
            }
        }

        if ctx.single_file {
            let mut printer = Printer::new();
            self.file_header(&mut printer, file, true);
            self.emit_top_level(&mut printer, file, &proto_scope)?;
            printer.newline();
            self.emit_file_object(&mut printer, file, &proto_scope);
            for (_, buf) in &service_bufs {
                printer.newline();
                printer.add(buf);
            }
            outputs.push(OutputFile {
                name: format!("{}{}.scala", dir, file_object_name(file.name())),
                content: printer.into_string(),
            });
            return Ok(outputs);
        }

        self.push_path(FileDescriptorProtoLocations::MESSAGE_TYPE);
        for (idx, message) in file.message_type.iter().enumerate() {
            self.push_path(idx as i32);
            let mut printer = Printer::new();
            self.file_header(&mut printer, file, false);
            let proto_fqn = format!("{}.{}", proto_scope, message.name());
            let java_ref = format!(
                "{}.javaDescriptor.getMessageTypes.get({})",
                ctx.file_object_fqn, idx
            );
            let result = self.emit_message(&mut printer, message, &proto_fqn, &java_ref);
            self.pop_path();
            result?;
            outputs.push(OutputFile {
                name: format!("{}{}.scala", dir, to_upper_camel(message.name())),
                content: printer.into_string(),
            });
        }
        self.pop_path();

        self.push_path(FileDescriptorProtoLocations::ENUM_TYPE);
        for (idx, enum_type) in file.enum_type.iter().enumerate() {
            self.push_path(idx as i32);
            let mut printer = Printer::new();
            self.file_header(&mut printer, file, false);
            let proto_fqn = format!("{}.{}", proto_scope, enum_type.name());
            let java_ref = format!(
                "{}.javaDescriptor.getEnumTypes.get({})",
                ctx.file_object_fqn, idx
            );
            self.emit_enum(&mut printer, enum_type, &proto_fqn, &java_ref);
            self.pop_path();
            outputs.push(OutputFile {
                name: format!("{}{}.scala", dir, to_upper_camel(enum_type.name())),
                content: printer.into_string(),
            });
        }
        self.pop_path();

        let mut printer = Printer::new();
        self.file_header(&mut printer, file, false);
        self.emit_file_object(&mut printer, file, &proto_scope);
        outputs.push(OutputFile {
            name: format!("{}{}.scala", dir, file_object_name(file.name())),
            content: printer.into_string(),
        });

        for (name, buf) in service_bufs {
            let mut printer = Printer::new();
            self.file_header(&mut printer, file, false);
            printer.add(&buf);
            outputs.push(OutputFile {
                name: format!("{}{}Grpc.scala", dir, name),
                content: printer.into_string(),
            });
        }

        Ok(outputs)
    }

    fn emit_top_level(
        &mut self,
        printer: &mut Printer,
        file: &FileDescriptorProto,
        proto_scope: &str,
    ) -> GeneratorResult<()> {
        self.push_path(FileDescriptorProtoLocations::MESSAGE_TYPE);
        for (idx, message) in file.message_type.iter().enumerate() {
            self.push_path(idx as i32);
            if idx > 0 {
                printer.newline();
            }
            let proto_fqn = format!("{}.{}", proto_scope, message.name());
            let java_ref = format!(
                "{}.javaDescriptor.getMessageTypes.get({})",
                self.file_ctx.file_object_fqn, idx
            );
            let result = self.emit_message(printer, message, &proto_fqn, &java_ref);
            self.pop_path();
            result?;
        }
        self.pop_path();

        self.push_path(FileDescriptorProtoLocations::ENUM_TYPE);
        for (idx, enum_type) in file.enum_type.iter().enumerate() {
            self.push_path(idx as i32);
            printer.newline();
            let proto_fqn = format!("{}.{}", proto_scope, enum_type.name());
            let java_ref = format!(
                "{}.javaDescriptor.getEnumTypes.get({})",
                self.file_ctx.file_object_fqn, idx
            );
            self.emit_enum(printer, enum_type, &proto_fqn, &java_ref);
            self.pop_path();
        }
        self.pop_path();

        Ok(())
    }

    fn file_header(&self, printer: &mut Printer, file: &FileDescriptorProto, with_preamble: bool) {
        printer.add("// Generated by protoc-gen-scala. DO NOT EDIT!");
        printer.add(format!("// source: {}", file.name()));
        printer.newline();
        if !self.file_ctx.target_package.is_empty() {
            printer.add(format!("package {}", self.file_ctx.target_package));
            printer.newline();
        }
        let mut any_import = false;
        if self.params.java_conversions {
            printer.add("import _root_.scala.jdk.CollectionConverters._");
            any_import = true;
        }
        for import in &self.file_ctx.imports {
            printer.add(format!("import {}", import));
            any_import = true;
        }
        if any_import {
            printer.newline();
        }
        if with_preamble && !self.file_ctx.preamble.is_empty() {
            printer.add_all(self.file_ctx.preamble.iter());
            printer.newline();
        }
    }

    /// The companion object rebuilding the file descriptor at run time from
    /// an embedded base64-chunked copy of the raw descriptor bytes.
    fn emit_file_object(
        &mut self,
        printer: &mut Printer,
        file: &FileDescriptorProto,
        proto_scope: &str,
    ) {
        let object_name = file_object_name(file.name());

        let mut proto = file.clone();
        proto.source_code_info = None;
        let encoded = STANDARD.encode(proto.encode_to_vec());
        let chunks: Vec<String> = encoded
            .as_bytes()
            .chunks(BASE64_CHUNK)
            .map(|chunk| format!("\"{}\"", std::str::from_utf8(chunk).unwrap()))
            .collect();

        printer.add(format!("object {} {{", object_name));
        printer.indented(|p| {
            p.add("private[this] val ProtoBytes: _root_.scala.Array[_root_.scala.Byte] =");
            p.indented(|p| {
                p.add(format!("{}.Encoding.fromBase64(_root_.scala.Seq(", RUNTIME));
                p.indented(|p| p.add_sep(chunks, ","));
                p.add(").mkString)");
            });
            p.add(format!(
                "lazy val javaDescriptor: {}.Descriptors.FileDescriptor = {{",
                JAVA_RUNTIME
            ));
            p.indented(|p| {
                p.add(format!(
                    "val __proto = {}.DescriptorProtos.FileDescriptorProto.parseFrom(ProtoBytes)",
                    JAVA_RUNTIME
                ));
                if file.dependency.is_empty() {
                    p.add(format!(
                        "{}.Descriptors.FileDescriptor.buildFrom(__proto, _root_.scala.Array.empty[{}.Descriptors.FileDescriptor])",
                        JAVA_RUNTIME, JAVA_RUNTIME
                    ));
                } else {
                    p.add(format!(
                        "{}.Descriptors.FileDescriptor.buildFrom(__proto, _root_.scala.Array(",
                        JAVA_RUNTIME
                    ));
                    let deps: Vec<String> = file
                        .dependency
                        .iter()
                        .map(|dependency| {
                            format!(
                                "{}.javaDescriptor",
                                self.registry.file(dependency).file_object_fqn
                            )
                        })
                        .collect();
                    p.indented(|p| p.add_sep(deps, ","));
                    p.add("))");
                }
            });
            p.add("}");

            self.push_path(FileDescriptorProtoLocations::EXTENSION);
            for (idx, extension) in file.extension.iter().enumerate() {
                self.push_path(idx as i32);
                p.newline();
                self.emit_extension(p, extension, proto_scope);
                self.pop_path();
            }
            self.pop_path();
        });
        printer.add("}");
    }
}
