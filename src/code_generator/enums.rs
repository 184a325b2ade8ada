use std::collections::HashSet;

use log::debug;
use prost_types::EnumDescriptorProto;

use super::*;
use crate::descriptor::RUNTIME;
use crate::ident::{escape_keyword, to_upper_camel};

impl CodeGenerator<'_> {
    /// Emits the sealed sum type and companion for one enum.
    ///
    /// Every declared value becomes a case object carrying `(value, index,
    /// name)`; unknown numbers round-trip through the synthesized
    /// `Unrecognized` case. Aliased numbers keep their own case objects and
    /// `values` entries but only the first occurrence decodes.
    pub(super) fn emit_enum(
        &mut self,
        printer: &mut Printer,
        desc: &EnumDescriptorProto,
        proto_fqn: &str,
        java_descriptor_ref: &str,
    ) {
        debug!("  enum: {:?}", desc.name());

        let name = to_upper_camel(desc.name());
        let scala_fqn = self.registry.scala_type(proto_fqn).to_string();
        let java_fqn = self.registry.java_type(proto_fqn).to_string();

        self.emit_docs(printer);
        printer.add(format!(
            "sealed abstract class {}(val value: _root_.scala.Int, val index: _root_.scala.Int, val name: _root_.scala.Predef.String) extends {}.GeneratedEnum {{",
            name, RUNTIME
        ));
        printer.indented(|p| {
            p.add(format!("type EnumType = {}", scala_fqn));
            p.add(format!(
                "def companion: {}.GeneratedEnumCompanion[{}] = {}",
                RUNTIME, scala_fqn, scala_fqn
            ));
            p.add(format!(
                "final def javaValueDescriptor: _root_.com.google.protobuf.Descriptors.EnumValueDescriptor = {}.javaDescriptor.getValues.get(index)",
                scala_fqn
            ));
            p.add("def isUnrecognized: _root_.scala.Boolean = false");
            for value in &desc.value {
                p.add(format!(
                    "def {}: _root_.scala.Boolean = false",
                    predicate_name(value.name())
                ));
            }
        });
        printer.add("}");
        printer.newline();

        printer.add(format!(
            "object {} extends {}.GeneratedEnumCompanion[{}] {{",
            name, RUNTIME, scala_fqn
        ));
        printer.indented(|p| {
            p.add(format!(
                "implicit def enumCompanion: {}.GeneratedEnumCompanion[{}] = this",
                RUNTIME, scala_fqn
            ));
            p.newline();

            self.push_path(EnumDescriptorProtoLocations::VALUE);
            for (idx, value) in desc.value.iter().enumerate() {
                self.push_path(idx as i32);
                self.emit_docs(p);
                self.pop_path();
                p.add(format!(
                    "case object {} extends {}({}, {}, \"{}\") {{",
                    escape_keyword(value.name().to_string()),
                    scala_fqn,
                    value.number(),
                    idx,
                    value.name()
                ));
                p.indented(|p| {
                    p.add(format!(
                        "override def {}: _root_.scala.Boolean = true",
                        predicate_name(value.name())
                    ));
                });
                p.add("}");
                p.newline();
            }
            self.pop_path();

            p.add(format!(
                "final case class Unrecognized(unrecognizedValue: _root_.scala.Int) extends {}(unrecognizedValue, -1, \"UNRECOGNIZED\") {{",
                scala_fqn
            ));
            p.indented(|p| {
                p.add("override def isUnrecognized: _root_.scala.Boolean = true");
            });
            p.add("}");
            p.newline();

            let all_values: Vec<String> = desc
                .value
                .iter()
                .map(|value| escape_keyword(value.name().to_string()))
                .collect();
            p.add(format!(
                "lazy val values: _root_.scala.Seq[{}] = _root_.scala.Seq({})",
                scala_fqn,
                all_values.join(", ")
            ));
            p.newline();

            p.add(format!(
                "def fromValue(__value: _root_.scala.Int): {} = __value match {{",
                scala_fqn
            ));
            p.indented(|p| {
                // Skip aliased numbers: only the first declaration decodes.
                let mut seen = HashSet::new();
                for value in &desc.value {
                    if !seen.insert(value.number()) {
                        continue;
                    }
                    p.add(format!(
                        "case {} => {}",
                        value.number(),
                        escape_keyword(value.name().to_string())
                    ));
                }
                p.add("case __other => Unrecognized(__other)");
            });
            p.add("}");
            p.newline();

            p.add(format!(
                "def javaDescriptor: _root_.com.google.protobuf.Descriptors.EnumDescriptor = {}",
                java_descriptor_ref
            ));

            p.when(self.params.java_conversions, |p| {
                p.newline();
                p.add(format!(
                    "def fromJavaValue(javaSource: {}): {} = fromValue(javaSource.getNumber)",
                    java_fqn, scala_fqn
                ));
                p.add(format!(
                    "def toJavaValue(scalaSource: {}): {} = {{",
                    scala_fqn, java_fqn
                ));
                p.indented(|p| {
                    p.add("_root_.scala.Predef.require(!scalaSource.isUnrecognized, \"Unrecognized enum value has no corresponding Java value\")");
                    p.add(format!("{}.forNumber(scalaSource.value)", java_fqn));
                });
                p.add("}");
            });
        });
        printer.add("}");
    }
}

/// `FOO_BAR` becomes the predicate `isFooBar`.
fn predicate_name(value_name: &str) -> String {
    format!("is{}", to_upper_camel(&value_name.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::predicate_name;

    #[test]
    fn test_predicate_name() {
        assert_eq!(predicate_name("RED"), "isRed");
        assert_eq!(predicate_name("FOO_BAR"), "isFooBar");
        assert_eq!(predicate_name("lowercase"), "isLowercase");
    }
}
