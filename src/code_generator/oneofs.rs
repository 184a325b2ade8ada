use prost_types::{DescriptorProto, FieldDescriptorProto, OneofDescriptorProto};

use super::*;
use crate::descriptor::{FieldView, RUNTIME};
use crate::error::{GeneratorError, GeneratorResult};
use crate::ident::{escape_keyword, to_lower_camel, to_upper_camel};

impl CodeGenerator<'_> {
    /// Fails when the oneof's derived sum-type name collides with a sibling
    /// nested message or enum in the same companion scope.
    pub(super) fn check_oneof_collision(
        &self,
        message: &DescriptorProto,
        oneof: &OneofDescriptorProto,
    ) -> GeneratorResult<()> {
        let type_name = to_upper_camel(oneof.name());
        let collides = message
            .nested_type
            .iter()
            .map(|nested| nested.name())
            .chain(message.enum_type.iter().map(|nested| nested.name()))
            .any(|name| to_upper_camel(name) == type_name);
        if collides {
            return Err(GeneratorError::OneofNameCollision {
                message: message.name().to_string(),
                oneof: oneof.name().to_string(),
                type_name,
            });
        }
        Ok(())
    }

    /// Emits the sealed sum type of one oneof group: an `Empty` case plus
    /// one case per member, each knowing its field number and exposing an
    /// option-shaped accessor per member.
    pub(super) fn emit_oneof(
        &mut self,
        printer: &mut Printer,
        message_scala_fqn: &str,
        fq_message_name: &str,
        oneof: &OneofDescriptorProto,
        oneof_idx: i32,
        members: &[(FieldDescriptorProto, usize)],
    ) {
        let type_name = to_upper_camel(oneof.name());
        let trait_fqn = format!("{}.{}", message_scala_fqn, type_name);
        let views: Vec<FieldView> = members
            .iter()
            .map(|(field, _)| FieldView::new(self.registry, self.syntax, fq_message_name, field))
            .collect();

        self.push_path(DescriptorProtoLocations::ONEOF_DECL);
        self.push_path(oneof_idx);
        self.emit_docs(printer);
        self.pop_path();
        self.pop_path();

        printer.add(format!(
            "sealed trait {} extends {}.GeneratedOneof {{",
            type_name, RUNTIME
        ));
        printer.indented(|p| {
            p.add("def isEmpty: _root_.scala.Boolean = false");
            p.add("def isDefined: _root_.scala.Boolean = true");
            p.add("def number: _root_.scala.Int");
            for view in &views {
                p.add(format!(
                    "def is{}: _root_.scala.Boolean = false",
                    view.name_upper()
                ));
            }
            for view in &views {
                p.add(format!(
                    "def {}: _root_.scala.Option[{}] = _root_.scala.None",
                    view.accessor(),
                    view.single_type()
                ));
            }
        });
        printer.add("}");
        printer.newline();

        printer.add(format!("object {} {{", type_name));
        printer.indented(|p| {
            p.add(format!("case object Empty extends {} {{", trait_fqn));
            p.indented(|p| {
                p.add("override def isEmpty: _root_.scala.Boolean = true");
                p.add("override def isDefined: _root_.scala.Boolean = false");
                p.add("override def number: _root_.scala.Int = 0");
            });
            p.add("}");
            for ((field, idx), view) in members.iter().zip(&views) {
                p.newline();
                self.push_path(DescriptorProtoLocations::FIELD);
                self.push_path(*idx as i32);
                self.emit_docs(p);
                self.pop_path();
                self.pop_path();
                p.add(format!(
                    "final case class {}(value: {}) extends {} {{",
                    view.name_upper(),
                    view.single_type(),
                    trait_fqn
                ));
                p.indented(|p| {
                    p.add(format!(
                        "override def is{}: _root_.scala.Boolean = true",
                        view.name_upper()
                    ));
                    p.add(format!(
                        "override def {}: _root_.scala.Option[{}] = _root_.scala.Some(value)",
                        view.accessor(),
                        view.single_type()
                    ));
                    p.add(format!(
                        "override def number: _root_.scala.Int = {}",
                        field.number()
                    ));
                });
                p.add("}");
            }
        });
        printer.add("}");
    }

    /// The Scala accessor holding a oneof group on its message.
    pub(super) fn oneof_accessor(oneof: &OneofDescriptorProto) -> String {
        escape_keyword(to_lower_camel(oneof.name()))
    }

    /// The raw camel name, used to derive `__`-prefixed locals that must
    /// not carry back-ticks.
    pub(super) fn oneof_slot(oneof: &OneofDescriptorProto) -> String {
        to_lower_camel(oneof.name())
    }
}
