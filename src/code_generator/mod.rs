//! The per-file emission pipeline: one `CodeGenerator` is built for each
//! requested file and walks its messages, enums, extensions and services,
//! printing Scala source through the `Printer`.

use log::debug;
use prost_types::field_descriptor_proto::Type;
use prost_types::{FieldDescriptorProto, FileDescriptorProto, SourceCodeInfo};

use crate::ast::Comments;
use crate::descriptor::{FileContext, TypeRegistry};
use crate::error::{GeneratorError, GeneratorResult};
use crate::options::Params;
use crate::printer::Printer;
use crate::syntax::Syntax;

mod locations;
use locations::*;

mod enums;
mod extensions;
mod files;
mod messages;
mod oneofs;
mod services;

pub struct CodeGenerator<'a> {
    registry: &'a TypeRegistry,
    params: Params,
    file_ctx: &'a FileContext,
    syntax: Syntax,
    /// Proto scope of the file (`.package`, or empty).
    proto_scope: String,
    source_info: Option<SourceCodeInfo>,
    path: Vec<i32>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        params: Params,
        file: &FileDescriptorProto,
    ) -> CodeGenerator<'a> {
        let source_info = file.source_code_info.clone().map(|mut s| {
            s.location.retain(|loc| {
                let len = loc.path.len();
                len > 0 && len % 2 == 0
            });
            s.location.sort_by(|a, b| a.path.cmp(&b.path));
            s
        });

        let file_ctx = registry.file(file.name());
        debug!(
            "file: {:?}, target package: {:?}",
            file.name(),
            file_ctx.target_package
        );

        CodeGenerator {
            registry,
            params,
            file_ctx,
            syntax: file_ctx.syntax,
            proto_scope: if file.package().is_empty() {
                String::new()
            } else {
                format!(".{}", file.package())
            },
            source_info,
            path: Vec::new(),
        }
    }

    fn push_path(&mut self, component: i32) {
        self.path.push(component);
    }

    fn pop_path(&mut self) {
        self.path.pop();
    }

    fn comments_at_path(&self) -> Option<Comments> {
        let source_info = self.source_info.as_ref()?;
        let idx = source_info
            .location
            .binary_search_by_key(&&self.path[..], |location| &location.path[..])
            .ok()?;
        Some(Comments::from_location(&source_info.location[idx]))
    }

    /// Prints the Scaladoc of the descriptor at the current path, when it
    /// has leading comments.
    fn emit_docs(&self, printer: &mut Printer) {
        if let Some(doc) = self.comments_at_path().and_then(|c| c.to_scaladoc()) {
            printer.add(doc);
        }
    }
}

/// Rejects GROUP-encoded fields before any emission touches them. Applies
/// to regular fields and to extension declarations at every scope.
fn check_no_group_fields<'a>(
    scope: &str,
    fields: impl Iterator<Item = &'a FieldDescriptorProto>,
) -> GeneratorResult<()> {
    for field in fields {
        if field.r#type() == Type::Group {
            return Err(GeneratorError::UnsupportedGroupField(format!(
                "{}.{}",
                scope.trim_start_matches('.'),
                field.name()
            )));
        }
    }
    Ok(())
}
