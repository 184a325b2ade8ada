use prost_types::field_descriptor_proto::Type;
use prost_types::FieldDescriptorProto;

use super::*;
use crate::descriptor::{FieldView, RUNTIME, WIRETYPE_FIXED32, WIRETYPE_FIXED64, WIRETYPE_VARINT};
use crate::expr::{Transform, TransformChain};

impl CodeGenerator<'_> {
    /// Emits the typed accessor for one extension field: a
    /// `GeneratedExtension` value whose decoder pulls the raw records out
    /// of the extendee's unknown fields and lifts them to the element type.
    pub(super) fn emit_extension(
        &mut self,
        printer: &mut Printer,
        extension: &FieldDescriptorProto,
        scope_proto_fqn: &str,
    ) {
        let view = FieldView::new(self.registry, self.syntax, scope_proto_fqn, extension);
        let extendee = self.registry.scala_type(extension.extendee()).to_string();
        let repeated = view.is_repeated();

        let container = if repeated {
            format!("_root_.scala.Seq[{}]", view.single_type())
        } else {
            format!("_root_.scala.Option[{}]", view.single_type())
        };

        let raw = match view.wire_type() {
            WIRETYPE_VARINT => format!("__uf.varints({})", extension.number()),
            WIRETYPE_FIXED32 => format!("__uf.fixed32s({})", extension.number()),
            WIRETYPE_FIXED64 => format!("__uf.fixed64s({})", extension.number()),
            _ => format!("__uf.lengthDelimited({})", extension.number()),
        };

        let lifted = element_chain(&view).apply(&raw, true);
        let decoder = if repeated {
            lifted
        } else {
            format!("{}.lastOption", lifted)
        };

        self.emit_docs(printer);
        printer.add(format!(
            "val {}: {}.GeneratedExtension[{}, {}] =",
            view.accessor(),
            RUNTIME,
            extendee,
            container
        ));
        printer.indented(|p| {
            p.add(format!(
                "{}.GeneratedExtension[{}, {}]({}, __uf => {})",
                RUNTIME,
                extendee,
                container,
                extension.number(),
                decoder
            ));
        });
    }
}

/// The transform from one raw unknown-field record (`Long` for varints,
/// `Int`/`Long` for fixed widths, `ByteString` for length-delimited) to the
/// element type, composed with the custom lift.
fn element_chain(view: &FieldView) -> TransformChain {
    let chain = match view.field.r#type() {
        Type::Int32 | Type::Uint32 => TransformChain::of(Transform::method("toInt")),
        Type::Int64 | Type::Uint64 => TransformChain::identity(),
        Type::Sint32 => TransformChain::of(Transform::method("toInt"))
            .then(Transform::function(format!("{}.Encoding.zigZagDecode32", RUNTIME))),
        Type::Sint64 => {
            TransformChain::of(Transform::function(format!("{}.Encoding.zigZagDecode64", RUNTIME)))
        }
        Type::Bool => TransformChain::of(Transform::operator("!= 0L")),
        Type::Fixed32 | Type::Sfixed32 => TransformChain::identity(),
        Type::Float => {
            TransformChain::of(Transform::function("_root_.java.lang.Float.intBitsToFloat"))
        }
        Type::Fixed64 | Type::Sfixed64 => TransformChain::identity(),
        Type::Double => {
            TransformChain::of(Transform::function("_root_.java.lang.Double.longBitsToDouble"))
        }
        Type::String => TransformChain::of(Transform::method("toStringUtf8")),
        Type::Bytes => TransformChain::identity(),
        Type::Enum => TransformChain::of(Transform::method("toInt")).then(Transform::function(
            format!("{}.fromValue", view.base_single_type()),
        )),
        Type::Message => TransformChain::of(Transform::method("newCodedInput")).then(
            Transform::function(format!("{}.parseFrom", view.base_single_type())),
        ),
        Type::Group => panic!("group fields are rejected before emission"),
    };
    match view.custom_type() {
        Some(custom) => chain.then(Transform::function(format!(
            "_root_.{}.toCustom",
            custom.trim_start_matches("_root_.")
        ))),
        None => chain,
    }
}
