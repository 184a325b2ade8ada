use itertools::{Either, Itertools};
use log::debug;
use multimap::MultiMap;
use prost_types::field_descriptor_proto::Type;
use prost_types::{DescriptorProto, FieldDescriptorProto, OneofDescriptorProto};

use super::*;
use crate::descriptor::{FieldCategory, FieldView, JAVA_RUNTIME, RUNTIME};
use crate::expr::{Transform, TransformChain};
use crate::ident::{to_lower_camel, to_upper_camel};

const OUTPUT_STREAM: &str = "_root_.com.google.protobuf.CodedOutputStream";

type OneofFields<'b> = MultiMap<i32, (usize, &'b FieldDescriptorProto)>;

/// One constructor parameter of the generated case class: a regular field,
/// or a whole oneof group placed at its first member's position.
enum CtorParam<'b> {
    Field(usize, &'b FieldDescriptorProto),
    Oneof(i32, &'b OneofDescriptorProto),
}

impl CodeGenerator<'_> {
    /// Emits the value type and companion of one message, recursing into
    /// nested scopes.
    pub(super) fn emit_message(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
        java_descriptor_ref: &str,
    ) -> GeneratorResult<()> {
        debug!("  message: {:?}", message.name());

        check_no_group_fields(
            proto_fqn,
            message.field.iter().chain(message.extension.iter()),
        )?;
        for oneof in &message.oneof_decl {
            self.check_oneof_collision(message, oneof)?;
        }

        let scala_fqn = self.registry.scala_type(proto_fqn).to_string();
        let name = to_upper_camel(message.name());

        // Split the fields into the regular ones and the oneof members,
        // keyed by oneof index. proto3 optionals sit in a synthetic oneof
        // that must not surface as a sum type.
        let (_, oneof_fields): (Vec<(usize, &FieldDescriptorProto)>, OneofFields) = message
            .field
            .iter()
            .enumerate()
            .partition_map(|(idx, field)| {
                if field.proto3_optional.unwrap_or(false) {
                    Either::Left((idx, field))
                } else if let Some(oneof_index) = field.oneof_index {
                    Either::Right((oneof_index, (idx, field)))
                } else {
                    Either::Left((idx, field))
                }
            });

        let ctor_params = self.ctor_params(message);

        self.emit_message_docs(printer, message);
        printer.add(format!("final case class {}(", name));
        printer.indented(|p| {
            p.indented(|p| {
                let params: Vec<String> = ctor_params
                    .iter()
                    .map(|param| match param {
                        CtorParam::Field(_, field) => {
                            let view = self.view(proto_fqn, field);
                            format!(
                                "{}: {} = {}",
                                view.accessor(),
                                view.container_type(),
                                view.container_default_expr()
                            )
                        }
                        CtorParam::Oneof(_, oneof) => {
                            let trait_fqn =
                                format!("{}.{}", scala_fqn, to_upper_camel(oneof.name()));
                            format!(
                                "{}: {} = {}.Empty",
                                Self::oneof_accessor(oneof),
                                trait_fqn,
                                trait_fqn
                            )
                        }
                    })
                    .collect();
                p.add_sep(params, ",");
            });
            p.add(format!(") extends {}.GeneratedMessage {{", RUNTIME));
        });

        printer.indented(|p| {
            self.emit_serialized_size(p, message, proto_fqn, &oneof_fields);
            p.newline();
            self.emit_write_to(p, message, proto_fqn, &oneof_fields);
            p.newline();
            self.emit_accessors(p, message, proto_fqn, &scala_fqn, &ctor_params);
            self.emit_get_field_by_number(p, message, proto_fqn);
            p.add(format!(
                "def getField(__field: {}.Descriptors.FieldDescriptor): _root_.scala.Any = getFieldByNumber(__field.getNumber)",
                JAVA_RUNTIME
            ));
            if self.params.single_line_to_string {
                p.add(format!(
                    "override def toString: _root_.scala.Predef.String = {}.TextFormat.printToSingleLineUnicodeString(this)",
                    RUNTIME
                ));
            } else {
                p.add(format!(
                    "override def toString: _root_.scala.Predef.String = {}.TextFormat.printToUnicodeString(this)",
                    RUNTIME
                ));
            }
            p.add(format!("def companion: {}.type = {}", scala_fqn, scala_fqn));
        });
        printer.add("}");
        printer.newline();

        self.emit_companion(printer, message, proto_fqn, &scala_fqn, java_descriptor_ref, &ctor_params, &oneof_fields)
    }

    fn view<'b>(&'b self, fq_message_name: &str, field: &'b FieldDescriptorProto) -> FieldView<'b> {
        FieldView::new(self.registry, self.syntax, fq_message_name, field)
    }

    /// Case-class parameters cannot carry doc comments, so field comments
    /// fold into the class Scaladoc as `@param` entries.
    fn emit_message_docs(&mut self, printer: &mut Printer, message: &DescriptorProto) {
        let mut lines = self
            .comments_at_path()
            .map(|comments| comments.leading)
            .unwrap_or_default();
        self.push_path(DescriptorProtoLocations::FIELD);
        for (idx, field) in message.field.iter().enumerate() {
            self.push_path(idx as i32);
            if let Some(comments) = self.comments_at_path() {
                if !comments.leading.is_empty() {
                    lines.push(format!(" @param {}", to_lower_camel(field.name())));
                    for line in &comments.leading {
                        lines.push(format!("  {}", line.trim()));
                    }
                }
            }
            self.pop_path();
        }
        self.pop_path();
        if let Some(doc) = crate::ast::scaladoc(&lines) {
            printer.add(doc);
        }
    }

    fn ctor_params<'b>(&self, message: &'b DescriptorProto) -> Vec<CtorParam<'b>> {
        let mut params = Vec::new();
        let mut seen_oneofs = std::collections::HashSet::new();
        for (idx, field) in message.field.iter().enumerate() {
            if field.proto3_optional.unwrap_or(false) {
                params.push(CtorParam::Field(idx, field));
            } else if let Some(oneof_index) = field.oneof_index {
                if seen_oneofs.insert(oneof_index) {
                    params.push(CtorParam::Oneof(
                        oneof_index,
                        &message.oneof_decl[oneof_index as usize],
                    ));
                }
            } else {
                params.push(CtorParam::Field(idx, field));
            }
        }
        params
    }

    /// Every field write site ordered by ascending field number: regular
    /// fields and oneof members interleave.
    fn wire_order<'b>(
        &self,
        message: &'b DescriptorProto,
        oneof_fields: &OneofFields<'b>,
    ) -> Vec<(Option<&'b OneofDescriptorProto>, &'b FieldDescriptorProto)> {
        let mut items: Vec<(Option<&OneofDescriptorProto>, &FieldDescriptorProto)> = message
            .field
            .iter()
            .map(|field| {
                let oneof = if field.proto3_optional.unwrap_or(false) {
                    None
                } else {
                    field
                        .oneof_index
                        .map(|idx| &message.oneof_decl[idx as usize])
                };
                (oneof, field)
            })
            .collect();
        debug_assert_eq!(
            oneof_fields.iter_all().map(|(_, v)| v.len()).sum::<usize>(),
            items.iter().filter(|(oneof, _)| oneof.is_some()).count()
        );
        items.sort_by_key(|(_, field)| field.number());
        items
    }

    fn emit_serialized_size(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
        oneof_fields: &OneofFields,
    ) {
        // Varint-packed fields memoise their body length; fixed-width
        // packed bodies are a multiplication and need no cache.
        for (oneof, field) in self.wire_order(message, oneof_fields) {
            let view = self.view(proto_fqn, field);
            if oneof.is_none() && view.is_packed() && view.fixed_size().is_none() {
                let acc = view.accessor();
                printer.add(format!(
                    "@transient private[this] var __{}PackedSizeMemoized: _root_.scala.Int = 0",
                    to_lower_camel(field.name())
                ));
                printer.add(format!(
                    "private[this] def __{}PackedSize: _root_.scala.Int = {{",
                    to_lower_camel(field.name())
                ));
                printer.indented(|p| {
                    p.add(format!(
                        "var __size = __{}PackedSizeMemoized",
                        to_lower_camel(field.name())
                    ));
                    p.add("if (__size == 0) {");
                    p.indented(|p| {
                        p.add("var __s: _root_.scala.Int = 0");
                        p.add(format!("{}.foreach {{ __item =>", acc));
                        p.indented(|p| {
                            let value = base_value_chain(&view).apply("__item", false);
                            p.add(format!(
                                "__s += {}.compute{}SizeNoTag({})",
                                OUTPUT_STREAM,
                                size_suffix(&view),
                                value
                            ));
                        });
                        p.add("}");
                        p.add("__size = __s + 1");
                        p.add(format!(
                            "__{}PackedSizeMemoized = __size",
                            to_lower_camel(field.name())
                        ));
                    });
                    p.add("}");
                    p.add("__size - 1");
                });
                printer.add("}");
            }
        }

        printer.add("@transient private[this] var __serializedSizeMemoized: _root_.scala.Int = 0");
        printer.block(
            "private[this] def __computeSerializedSize(): _root_.scala.Int = {",
            "}",
            |p| {
                p.add("var __size = 0");
                for (oneof, field) in self.wire_order(message, oneof_fields) {
                    let view = self.view(proto_fqn, field);
                    match oneof {
                        Some(oneof) => {
                            let member = format!(
                                "{}.{}",
                                Self::oneof_accessor(oneof),
                                view.accessor()
                            );
                            self.size_foreach(p, &view, &member);
                        }
                        None => self.size_regular(p, &view),
                    }
                }
                p.add("__size");
            },
        );
        printer.block("override def serializedSize: _root_.scala.Int = {", "}", |p| {
            p.add("var __size = __serializedSizeMemoized");
            p.block("if (__size == 0) {", "}", |p| {
                p.add("__size = __computeSerializedSize() + 1");
                p.add("__serializedSizeMemoized = __size");
            });
            p.add("__size - 1");
        });
    }

    fn size_regular(&self, printer: &mut Printer, view: &FieldView) {
        let acc = view.accessor();
        match view.category() {
            FieldCategory::Required => {
                printer.add("{");
                printer.indented(|p| {
                    p.add(format!(
                        "val __value = {}",
                        base_value_chain(view).apply(&acc, false)
                    ));
                    p.add(format!("__size += {}", size_expr(view, "__value")));
                });
                printer.add("}");
            }
            FieldCategory::Singular => {
                printer.add("{");
                printer.indented(|p| {
                    p.add(format!(
                        "val __value = {}",
                        base_value_chain(view).apply(&acc, false)
                    ));
                    p.add(format!("if ({}) {{", nondefault_guard(view, "__value")));
                    p.indented(|p| {
                        p.add(format!("__size += {}", size_expr(view, "__value")));
                    });
                    p.add("}");
                });
                printer.add("}");
            }
            FieldCategory::Optional => self.size_foreach(printer, view, &acc),
            FieldCategory::Repeated if view.is_packed() => {
                printer.add(format!("if ({}.nonEmpty) {{", acc));
                printer.indented(|p| {
                    let body = match view.fixed_size() {
                        Some(width) => format!("{}.size * {}", acc, width),
                        None => format!("__{}PackedSize", to_lower_camel(view.field.name())),
                    };
                    p.add(format!("val __localsize = {}", body));
                    p.add(format!(
                        "__size += {}.computeTagSize({}) + {}.computeUInt32SizeNoTag(__localsize) + __localsize",
                        OUTPUT_STREAM,
                        view.number(),
                        OUTPUT_STREAM
                    ));
                });
                printer.add("}");
            }
            FieldCategory::Repeated => self.size_foreach(printer, view, &acc),
            FieldCategory::Map => {
                let entry = view.map_entry_scala_type();
                printer.add(format!("{}.foreach {{ __item =>", acc));
                printer.indented(|p| {
                    p.add(format!("val __entry = {}.pairMapper.toBase(__item)", entry));
                    p.add(format!(
                        "__size += {}.computeTagSize({}) + {}.computeUInt32SizeNoTag(__entry.serializedSize) + __entry.serializedSize",
                        OUTPUT_STREAM,
                        view.number(),
                        OUTPUT_STREAM
                    ));
                });
                printer.add("}");
            }
            FieldCategory::OneofMember => unreachable!("oneof members size via size_foreach"),
        }
    }

    /// Option- and Seq-shaped contributions share the foreach form.
    fn size_foreach(&self, printer: &mut Printer, view: &FieldView, source: &str) {
        printer.add(format!("{}.foreach {{ __item =>", source));
        printer.indented(|p| {
            p.add(format!(
                "val __value = {}",
                base_value_chain(view).apply("__item", false)
            ));
            p.add(format!("__size += {}", size_expr(view, "__value")));
        });
        printer.add("}");
    }

    fn emit_write_to(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
        oneof_fields: &OneofFields,
    ) {
        printer.add(format!(
            "override def writeTo(_output__: {}): _root_.scala.Unit = {{",
            OUTPUT_STREAM
        ));
        printer.indented(|p| {
            for (oneof, field) in self.wire_order(message, oneof_fields) {
                let view = self.view(proto_fqn, field);
                match oneof {
                    Some(oneof) => {
                        let member =
                            format!("{}.{}", Self::oneof_accessor(oneof), view.accessor());
                        self.write_foreach(p, &view, &member);
                    }
                    None => self.write_regular(p, &view),
                }
            }
        });
        printer.add("}");
    }

    fn write_regular(&self, printer: &mut Printer, view: &FieldView) {
        let acc = view.accessor();
        match view.category() {
            FieldCategory::Required => {
                printer.add("{");
                printer.indented(|p| {
                    p.add(format!(
                        "val __v = {}",
                        base_value_chain(view).apply(&acc, false)
                    ));
                    p.add_all(write_stmts(view, "__v"));
                });
                printer.add("}");
            }
            FieldCategory::Singular => {
                printer.add("{");
                printer.indented(|p| {
                    p.add(format!(
                        "val __v = {}",
                        base_value_chain(view).apply(&acc, false)
                    ));
                    p.add(format!("if ({}) {{", nondefault_guard(view, "__v")));
                    p.indented(|p| p.add_all(write_stmts(view, "__v")));
                    p.add("}");
                });
                printer.add("}");
            }
            FieldCategory::Optional => self.write_foreach(printer, view, &acc),
            FieldCategory::Repeated if view.is_packed() => {
                printer.add(format!("if ({}.nonEmpty) {{", acc));
                printer.indented(|p| {
                    let body = match view.fixed_size() {
                        Some(width) => format!("{}.size * {}", acc, width),
                        None => format!("__{}PackedSize", to_lower_camel(view.field.name())),
                    };
                    p.add(format!("_output__.writeTag({}, 2)", view.number()));
                    p.add(format!("_output__.writeUInt32NoTag({})", body));
                    p.add(format!("{}.foreach {{ __m =>", acc));
                    p.indented(|p| {
                        let value = base_value_chain(view).apply("__m", false);
                        p.add(format!(
                            "_output__.write{}NoTag({})",
                            size_suffix(view),
                            value
                        ));
                    });
                    p.add("}");
                });
                printer.add("}");
            }
            FieldCategory::Repeated => self.write_foreach(printer, view, &acc),
            FieldCategory::Map => {
                let entry = view.map_entry_scala_type();
                printer.add(format!("{}.foreach {{ __item =>", acc));
                printer.indented(|p| {
                    p.add(format!("val __v = {}.pairMapper.toBase(__item)", entry));
                    p.add(format!("_output__.writeTag({}, 2)", view.number()));
                    p.add("_output__.writeUInt32NoTag(__v.serializedSize)");
                    p.add("__v.writeTo(_output__)");
                });
                printer.add("}");
            }
            FieldCategory::OneofMember => unreachable!("oneof members write via write_foreach"),
        }
    }

    fn write_foreach(&self, printer: &mut Printer, view: &FieldView, source: &str) {
        printer.add(format!("{}.foreach {{ __item =>", source));
        printer.indented(|p| {
            p.add(format!(
                "val __v = {}",
                base_value_chain(view).apply("__item", false)
            ));
            p.add_all(write_stmts(view, "__v"));
        });
        printer.add("}");
    }

    fn emit_accessors(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
        scala_fqn: &str,
        ctor_params: &[CtorParam],
    ) {
        for param in ctor_params {
            match param {
                CtorParam::Field(_, field) => {
                    let view = self.view(proto_fqn, field);
                    let acc = view.accessor();
                    let upper = view.name_upper();
                    match view.category() {
                        FieldCategory::Singular | FieldCategory::Required => {
                            printer.add(format!(
                                "def with{}(__v: {}): {} = copy({} = __v)",
                                upper,
                                view.single_type(),
                                scala_fqn,
                                acc
                            ));
                            printer.add(format!(
                                "def clear{}: {} = copy({} = {})",
                                upper,
                                scala_fqn,
                                acc,
                                view.single_default_expr()
                            ));
                        }
                        FieldCategory::Optional => {
                            printer.add(format!(
                                "def {}OrDefault: {} = {}.getOrElse({})",
                                to_lower_camel(field.name()),
                                view.single_type(),
                                acc,
                                view.single_default_expr()
                            ));
                            printer.add(format!(
                                "def has{}: _root_.scala.Boolean = {}.isDefined",
                                upper, acc
                            ));
                            printer.add(format!(
                                "def with{}(__v: {}): {} = copy({} = _root_.scala.Some(__v))",
                                upper,
                                view.single_type(),
                                scala_fqn,
                                acc
                            ));
                            printer.add(format!(
                                "def clear{}: {} = copy({} = _root_.scala.None)",
                                upper, scala_fqn, acc
                            ));
                        }
                        FieldCategory::Repeated => {
                            printer.add(format!(
                                "def add{}(__vs: {}*): {} = addAll{}(__vs)",
                                upper,
                                view.single_type(),
                                scala_fqn,
                                upper
                            ));
                            printer.add(format!(
                                "def addAll{}(__vs: _root_.scala.Iterable[{}]): {} = copy({} = {} ++ __vs)",
                                upper,
                                view.single_type(),
                                scala_fqn,
                                acc,
                                acc
                            ));
                            printer.add(format!(
                                "def with{}(__v: _root_.scala.Seq[{}]): {} = copy({} = __v)",
                                upper,
                                view.single_type(),
                                scala_fqn,
                                acc
                            ));
                            printer.add(format!(
                                "def clear{}: {} = copy({} = _root_.scala.Seq.empty)",
                                upper, scala_fqn, acc
                            ));
                        }
                        FieldCategory::Map => {
                            let (key, value) = view.map_entry_views().unwrap();
                            let pair = format!("({}, {})", key.single_type(), value.single_type());
                            printer.add(format!(
                                "def add{}(__vs: {}*): {} = addAll{}(__vs)",
                                upper, pair, scala_fqn, upper
                            ));
                            printer.add(format!(
                                "def addAll{}(__vs: _root_.scala.Iterable[{}]): {} = copy({} = {} ++ __vs)",
                                upper, pair, scala_fqn, acc, acc
                            ));
                            printer.add(format!(
                                "def with{}(__v: {}): {} = copy({} = __v)",
                                upper,
                                view.container_type(),
                                scala_fqn,
                                acc
                            ));
                            printer.add(format!(
                                "def clear{}: {} = copy({} = _root_.scala.collection.immutable.Map.empty)",
                                upper, scala_fqn, acc
                            ));
                        }
                        FieldCategory::OneofMember => unreachable!(),
                    }
                }
                CtorParam::Oneof(oneof_index, oneof) => {
                    let oneof_acc = Self::oneof_accessor(oneof);
                    let oneof_upper = to_upper_camel(oneof.name());
                    let trait_fqn = format!("{}.{}", scala_fqn, oneof_upper);
                    for field in message.field.iter().filter(|field| {
                        field.oneof_index == Some(*oneof_index)
                            && !field.proto3_optional.unwrap_or(false)
                    }) {
                        let view = self.view(proto_fqn, field);
                        let upper = view.name_upper();
                        printer.add(format!(
                            "def {}OrDefault: {} = {}.{}.getOrElse({})",
                            to_lower_camel(field.name()),
                            view.single_type(),
                            oneof_acc,
                            view.accessor(),
                            view.single_default_expr()
                        ));
                        printer.add(format!(
                            "def with{}(__v: {}): {} = copy({} = {}.{}(__v))",
                            upper,
                            view.single_type(),
                            scala_fqn,
                            oneof_acc,
                            trait_fqn,
                            upper
                        ));
                    }
                    printer.add(format!(
                        "def with{}(__v: {}): {} = copy({} = __v)",
                        oneof_upper, trait_fqn, scala_fqn, oneof_acc
                    ));
                    printer.add(format!(
                        "def clear{}: {} = copy({} = {}.Empty)",
                        oneof_upper, scala_fqn, oneof_acc, trait_fqn
                    ));
                }
            }
        }
    }

    fn emit_get_field_by_number(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
    ) {
        printer.add(
            "def getFieldByNumber(__fieldNumber: _root_.scala.Int): _root_.scala.Any = {",
        );
        if message.field.is_empty() {
            printer.indented(|p| p.add("throw new _root_.scala.MatchError(__fieldNumber)"));
            printer.add("}");
            return;
        }
        printer.indented(|p| {
            p.add("(__fieldNumber: @_root_.scala.unchecked) match {");
            p.indented(|p| {
                for field in &message.field {
                    let view = self.view(proto_fqn, field);
                    let in_oneof = view.is_in_oneof();
                    let source = if in_oneof {
                        let oneof =
                            &message.oneof_decl[field.oneof_index.unwrap() as usize];
                        format!("{}.{}", Self::oneof_accessor(oneof), view.accessor())
                    } else {
                        view.accessor()
                    };
                    p.add(format!(
                        "case {} => {}",
                        field.number(),
                        reflection_value(&view, &source, in_oneof)
                    ));
                }
            });
            p.add("}");
        });
        printer.add("}");
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_companion(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
        scala_fqn: &str,
        java_descriptor_ref: &str,
        ctor_params: &[CtorParam],
        oneof_fields: &OneofFields,
    ) -> GeneratorResult<()> {
        let name = to_upper_camel(message.name());
        printer.add(format!(
            "object {} extends {}.GeneratedMessageCompanion[{}] {{",
            name, RUNTIME, scala_fqn
        ));

        let mut result = Ok(());
        printer.indented(|p| {
            p.add(format!(
                "implicit def messageCompanion: {}.GeneratedMessageCompanion[{}] = this",
                RUNTIME, scala_fqn
            ));
            p.add(format!(
                "def javaDescriptor: {}.Descriptors.Descriptor = {}",
                JAVA_RUNTIME, java_descriptor_ref
            ));
            p.add(format!("lazy val defaultInstance: {} = {}()", scala_fqn, scala_fqn));
            p.newline();

            self.emit_parse_from(p, message, proto_fqn, scala_fqn, ctor_params);
            p.newline();
            self.emit_from_fields_map(p, message, proto_fqn, scala_fqn, ctor_params);
            self.emit_companions_for_field_number(p, message, proto_fqn);

            if let Some((key, value)) = self.registry.map_entry_fields(proto_fqn) {
                let key_view = self.view(proto_fqn, key);
                let value_view = self.view(proto_fqn, value);
                p.newline();
                p.add(format!(
                    "implicit val pairMapper: {}.TypeMapper[{}, ({}, {})] =",
                    RUNTIME,
                    scala_fqn,
                    key_view.single_type(),
                    value_view.single_type()
                ));
                p.indented(|p| {
                    p.add(format!(
                        "{}.TypeMapper[{}, ({}, {})](__m => (__m.key, __m.value))(__p => {}(__p._1, __p._2))",
                        RUNTIME,
                        scala_fqn,
                        key_view.single_type(),
                        value_view.single_type(),
                        scala_fqn
                    ));
                });
            }

            if self.params.java_conversions {
                p.newline();
                self.emit_java_conversions(p, message, proto_fqn, scala_fqn, ctor_params);
            }

            // Nested scopes live in the companion object.
            self.push_path(DescriptorProtoLocations::NESTED_TYPE);
            for (idx, nested) in message.nested_type.iter().enumerate() {
                self.push_path(idx as i32);
                p.newline();
                let nested_fqn = format!("{}.{}", proto_fqn, nested.name());
                let nested_ref = format!(
                    "{}.javaDescriptor.getNestedTypes.get({})",
                    scala_fqn, idx
                );
                if let Err(error) = self.emit_message(p, nested, &nested_fqn, &nested_ref) {
                    if result.is_ok() {
                        result = Err(error);
                    }
                }
                self.pop_path();
            }
            self.pop_path();

            self.push_path(DescriptorProtoLocations::ENUM_TYPE);
            for (idx, nested) in message.enum_type.iter().enumerate() {
                self.push_path(idx as i32);
                p.newline();
                let nested_fqn = format!("{}.{}", proto_fqn, nested.name());
                let nested_ref =
                    format!("{}.javaDescriptor.getEnumTypes.get({})", scala_fqn, idx);
                self.emit_enum(p, nested, &nested_fqn, &nested_ref);
                self.pop_path();
            }
            self.pop_path();

            for (idx, oneof) in message.oneof_decl.iter().enumerate() {
                let idx = idx as i32;
                // proto3 optionals leave their synthetic oneof memberless.
                let members: Vec<(usize, &FieldDescriptorProto)> = match oneof_fields.get_vec(&idx)
                {
                    Some(members) => members.clone(),
                    None => continue,
                };
                let members: Vec<(prost_types::FieldDescriptorProto, usize)> = members
                    .into_iter()
                    .map(|(field_idx, field)| (field.clone(), field_idx))
                    .collect();
                p.newline();
                self.emit_oneof(p, scala_fqn, proto_fqn, oneof, idx, &members);
            }

            self.push_path(DescriptorProtoLocations::EXTENSION);
            for (idx, extension) in message.extension.iter().enumerate() {
                self.push_path(idx as i32);
                p.newline();
                self.emit_extension(p, extension, proto_fqn);
                self.pop_path();
            }
            self.pop_path();
        });
        printer.add("}");
        result
    }

    fn emit_parse_from(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
        scala_fqn: &str,
        ctor_params: &[CtorParam],
    ) {
        printer.add(format!(
            "def parseFrom(_input__: {}.CodedInputStream): {} = {{",
            JAVA_RUNTIME, scala_fqn
        ));
        printer.indented(|p| {
            // Mutable slots, one per constructor parameter.
            for param in ctor_params {
                match param {
                    CtorParam::Field(_, field) => {
                        let view = self.view(proto_fqn, field);
                        let acc = to_lower_camel(field.name());
                        match view.category() {
                            FieldCategory::Singular | FieldCategory::Required => {
                                p.add(format!(
                                    "var __{}: {} = {}",
                                    acc,
                                    view.single_type(),
                                    view.single_default_expr()
                                ));
                            }
                            FieldCategory::Optional => {
                                p.add(format!(
                                    "var __{}: _root_.scala.Option[{}] = _root_.scala.None",
                                    acc,
                                    view.single_type()
                                ));
                            }
                            FieldCategory::Repeated => {
                                p.add(format!(
                                    "val __{}: _root_.scala.collection.immutable.VectorBuilder[{}] = new _root_.scala.collection.immutable.VectorBuilder[{}]",
                                    acc,
                                    view.single_type(),
                                    view.single_type()
                                ));
                            }
                            FieldCategory::Map => {
                                let (key, value) = view.map_entry_views().unwrap();
                                p.add(format!(
                                    "val __{} = _root_.scala.collection.immutable.Map.newBuilder[{}, {}]",
                                    acc,
                                    key.single_type(),
                                    value.single_type()
                                ));
                            }
                            FieldCategory::OneofMember => unreachable!(),
                        }
                    }
                    CtorParam::Oneof(_, oneof) => {
                        let trait_fqn = format!("{}.{}", scala_fqn, to_upper_camel(oneof.name()));
                        p.add(format!(
                            "var __{}: {} = {}.Empty",
                            Self::oneof_slot(oneof),
                            trait_fqn,
                            trait_fqn
                        ));
                    }
                }
            }
            p.add("var _done__ = false");
            p.add("while (!_done__) {");
            p.indented(|p| {
                p.add("val _tag__ = _input__.readTag()");
                p.add("_tag__ match {");
                p.indented(|p| {
                    p.add("case 0 => _done__ = true");
                    for param in ctor_params {
                        match param {
                            CtorParam::Field(_, field) => {
                                let view = self.view(proto_fqn, field);
                                self.decode_arms(p, &view, None, scala_fqn);
                            }
                            CtorParam::Oneof(oneof_index, oneof) => {
                                for field in message.field.iter().filter(|field| {
                                    field.oneof_index == Some(*oneof_index)
                                        && !field.proto3_optional.unwrap_or(false)
                                }) {
                                    let view = self.view(proto_fqn, field);
                                    self.decode_arms(p, &view, Some(oneof), scala_fqn);
                                }
                            }
                        }
                    }
                    p.add("case tag => _input__.skipField(tag)");
                });
                p.add("}");
            });
            p.add("}");
            let args: Vec<String> = ctor_params
                .iter()
                .map(|param| match param {
                    CtorParam::Field(_, field) => {
                        let view = self.view(proto_fqn, field);
                        let acc = to_lower_camel(field.name());
                        match view.category() {
                            FieldCategory::Repeated | FieldCategory::Map => {
                                format!("{} = __{}.result()", view.accessor(), acc)
                            }
                            _ => format!("{} = __{}", view.accessor(), acc),
                        }
                    }
                    CtorParam::Oneof(_, oneof) => {
                        format!(
                            "{} = __{}",
                            Self::oneof_accessor(oneof),
                            Self::oneof_slot(oneof)
                        )
                    }
                })
                .collect();
            p.add(format!("{}(", scala_fqn));
            p.indented(|p| p.add_sep(args, ","));
            p.add(")");
        });
        printer.add("}");
    }

    /// The match arms decoding one field: its declared encoding, plus the
    /// alternate packed/unpacked form when the type is packable.
    fn decode_arms(
        &self,
        printer: &mut Printer,
        view: &FieldView,
        oneof: Option<&OneofDescriptorProto>,
        scala_fqn: &str,
    ) {
        let slot = format!(
            "__{}",
            oneof
                .map(Self::oneof_slot)
                .unwrap_or_else(|| to_lower_camel(view.field.name()))
        );
        let read_one = view
            .to_custom_chain()
            .apply(&view.read_expr("_input__"), false);

        match (oneof, view.category()) {
            (Some(oneof), _) => {
                let case_fqn = format!(
                    "{}.{}.{}",
                    scala_fqn,
                    to_upper_camel(oneof.name()),
                    view.name_upper()
                );
                if view.is_message() {
                    let old = view.to_base_chain().apply(
                        &format!("{}.{}", slot, view.accessor()),
                        true,
                    );
                    let merged = format!(
                        "{}.LiteParser.readMessage(_input__, {}.getOrElse({}.defaultInstance))",
                        RUNTIME,
                        old,
                        view.base_single_type()
                    );
                    printer.add(format!(
                        "case {} => {} = {}({})",
                        view.tag(),
                        slot,
                        case_fqn,
                        view.to_custom_chain().apply(&merged, false)
                    ));
                } else {
                    printer.add(format!(
                        "case {} => {} = {}({})",
                        view.tag(),
                        slot,
                        case_fqn,
                        read_one
                    ));
                }
            }
            (None, FieldCategory::Singular) => {
                printer.add(format!("case {} => {} = {}", view.tag(), slot, read_one));
            }
            (None, FieldCategory::Required) => {
                if view.is_message() {
                    let old = view.to_base_chain().apply(&slot, false);
                    let merged = format!(
                        "{}.LiteParser.readMessage(_input__, {})",
                        RUNTIME, old
                    );
                    printer.add(format!(
                        "case {} => {} = {}",
                        view.tag(),
                        slot,
                        view.to_custom_chain().apply(&merged, false)
                    ));
                } else {
                    printer.add(format!("case {} => {} = {}", view.tag(), slot, read_one));
                }
            }
            (None, FieldCategory::Optional) => {
                if view.is_message() {
                    let old = view.to_base_chain().apply(&slot, true);
                    let merged = format!(
                        "{}.LiteParser.readMessage(_input__, {}.getOrElse({}.defaultInstance))",
                        RUNTIME,
                        old,
                        view.base_single_type()
                    );
                    printer.add(format!(
                        "case {} => {} = _root_.scala.Some({})",
                        view.tag(),
                        slot,
                        view.to_custom_chain().apply(&merged, false)
                    ));
                } else {
                    printer.add(format!(
                        "case {} => {} = _root_.scala.Some({})",
                        view.tag(),
                        slot,
                        read_one
                    ));
                }
            }
            (None, FieldCategory::Repeated) => {
                if view.is_message() {
                    let read = format!(
                        "{}.LiteParser.readMessage(_input__, {}.defaultInstance)",
                        RUNTIME,
                        view.base_single_type()
                    );
                    printer.add(format!(
                        "case {} => {} += {}",
                        view.tag(),
                        slot,
                        view.to_custom_chain().apply(&read, false)
                    ));
                } else {
                    let element_tag = if view.is_packed() {
                        view.alternate_tag().unwrap()
                    } else {
                        view.tag()
                    };
                    let packed_tag = if view.is_packed() {
                        view.tag()
                    } else {
                        view.alternate_tag().unwrap()
                    };
                    printer.add(format!(
                        "case {} => {} += {}",
                        element_tag, slot, read_one
                    ));
                    printer.add(format!("case {} => {{", packed_tag));
                    printer.indented(|p| {
                        p.add("val length = _input__.readRawVarint32()");
                        p.add("val oldLimit = _input__.pushLimit(length)");
                        p.add("while (_input__.getBytesUntilLimit > 0) {");
                        p.indented(|p| {
                            p.add(format!("{} += {}", slot, read_one));
                        });
                        p.add("}");
                        p.add("_input__.popLimit(oldLimit)");
                    });
                    printer.add("}");
                }
            }
            (None, FieldCategory::Map) => {
                let entry = view.map_entry_scala_type();
                printer.add(format!(
                    "case {} => {} += {}.pairMapper.toCustom({}.LiteParser.readMessage(_input__, {}.defaultInstance))",
                    view.tag(),
                    slot,
                    entry,
                    RUNTIME,
                    entry
                ));
            }
            (None, FieldCategory::OneofMember) => unreachable!(),
        }
    }

    fn emit_from_fields_map(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
        scala_fqn: &str,
        ctor_params: &[CtorParam],
    ) {
        printer.add(format!(
            "def fromFieldsMap(__fieldsMap: _root_.scala.collection.immutable.Map[{}.Descriptors.FieldDescriptor, _root_.scala.Any]): {} = {{",
            JAVA_RUNTIME, scala_fqn
        ));
        printer.indented(|p| {
            p.add("val __fields = javaDescriptor.getFields");
            let args: Vec<String> = ctor_params
                .iter()
                .map(|param| match param {
                    CtorParam::Field(idx, field) => {
                        let view = self.view(proto_fqn, field);
                        format!(
                            "{} = {}",
                            view.accessor(),
                            from_fields_entry(&view, &format!("__fields.get({})", idx))
                        )
                    }
                    CtorParam::Oneof(oneof_index, oneof) => {
                        let members: Vec<(usize, &FieldDescriptorProto)> = message
                            .field
                            .iter()
                            .enumerate()
                            .filter(|(_, field)| {
                                field.oneof_index == Some(*oneof_index)
                                    && !field.proto3_optional.unwrap_or(false)
                            })
                            .collect();
                        let chain = members
                            .iter()
                            .map(|(idx, field)| {
                                let view = self.view(proto_fqn, field);
                                let case_fqn = format!(
                                    "{}.{}.{}",
                                    scala_fqn,
                                    to_upper_camel(oneof.name()),
                                    view.name_upper()
                                );
                                from_fields_oneof_member(
                                    &view,
                                    &format!("__fields.get({})", idx),
                                    &case_fqn,
                                )
                            })
                            .collect::<Vec<_>>()
                            .join(".orElse(");
                        let closers = ")".repeat(members.len().saturating_sub(1));
                        format!(
                            "{} = {}{}.getOrElse({}.{}.Empty)",
                            Self::oneof_accessor(oneof),
                            chain,
                            closers,
                            scala_fqn,
                            to_upper_camel(oneof.name())
                        )
                    }
                })
                .collect();
            p.add(format!("{}(", scala_fqn));
            p.indented(|p| p.add_sep(args, ","));
            p.add(")");
        });
        printer.add("}");
    }

    fn emit_companions_for_field_number(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
    ) {
        let message_fields: Vec<(i32, String)> = message
            .field
            .iter()
            .filter_map(|field| {
                let view = self.view(proto_fqn, field);
                if view.is_map() {
                    Some((field.number(), view.map_entry_scala_type()))
                } else if view.is_message() {
                    Some((field.number(), view.base_single_type()))
                } else {
                    None
                }
            })
            .collect();
        if !message_fields.is_empty() {
            printer.add(format!(
                "def messageCompanionForFieldNumber(__number: _root_.scala.Int): {}.GeneratedMessageCompanion[_] = {{",
                RUNTIME
            ));
            printer.indented(|p| {
                p.add("(__number: @_root_.scala.unchecked) match {");
                p.indented(|p| {
                    for (number, companion) in &message_fields {
                        p.add(format!("case {} => {}", number, companion));
                    }
                });
                p.add("}");
            });
            printer.add("}");
        }

        let enum_fields: Vec<(i32, String)> = message
            .field
            .iter()
            .filter_map(|field| {
                let view = self.view(proto_fqn, field);
                if view.is_enum() {
                    Some((field.number(), view.base_single_type()))
                } else {
                    None
                }
            })
            .collect();
        if !enum_fields.is_empty() {
            printer.add(format!(
                "def enumCompanionForFieldNumber(__fieldNumber: _root_.scala.Int): {}.GeneratedEnumCompanion[_] = {{",
                RUNTIME
            ));
            printer.indented(|p| {
                p.add("(__fieldNumber: @_root_.scala.unchecked) match {");
                p.indented(|p| {
                    for (number, companion) in &enum_fields {
                        p.add(format!("case {} => {}", number, companion));
                    }
                });
                p.add("}");
            });
            printer.add("}");
        }
    }

    fn emit_java_conversions(
        &mut self,
        printer: &mut Printer,
        message: &DescriptorProto,
        proto_fqn: &str,
        scala_fqn: &str,
        ctor_params: &[CtorParam],
    ) {
        let java_fqn = self.registry.java_type(proto_fqn).to_string();

        printer.add(format!(
            "def toJavaProto(scalaSource: {}): {} = {{",
            scala_fqn, java_fqn
        ));
        printer.indented(|p| {
            p.add(format!("val javaPbOut = {}.newBuilder", java_fqn));
            for param in ctor_params {
                match param {
                    CtorParam::Field(_, field) => {
                        let view = self.view(proto_fqn, field);
                        p.add_all(self.to_java_stmts(&view, "scalaSource"));
                    }
                    CtorParam::Oneof(oneof_index, oneof) => {
                        for field in message.field.iter().filter(|field| {
                            field.oneof_index == Some(*oneof_index)
                                && !field.proto3_optional.unwrap_or(false)
                        }) {
                            let view = self.view(proto_fqn, field);
                            let source = format!(
                                "scalaSource.{}.{}",
                                Self::oneof_accessor(oneof),
                                view.accessor()
                            );
                            p.add(format!("{}.foreach {{ __v =>", source));
                            p.indented(|p| {
                                p.add(self.java_set_stmt(&view, "__v"));
                            });
                            p.add("}");
                        }
                    }
                }
            }
            p.add("javaPbOut.build");
        });
        printer.add("}");

        printer.add(format!(
            "def fromJavaProto(javaSource: {}): {} = {}(",
            java_fqn, scala_fqn, scala_fqn
        ));
        printer.indented(|p| {
            let args: Vec<String> = ctor_params
                .iter()
                .map(|param| match param {
                    CtorParam::Field(_, field) => {
                        let view = self.view(proto_fqn, field);
                        format!(
                            "{} = {}",
                            view.accessor(),
                            self.from_java_expr(&view, "javaSource")
                        )
                    }
                    CtorParam::Oneof(oneof_index, oneof) => {
                        let members: Vec<&FieldDescriptorProto> = message
                            .field
                            .iter()
                            .filter(|field| {
                                field.oneof_index == Some(*oneof_index)
                                    && !field.proto3_optional.unwrap_or(false)
                            })
                            .collect();
                        let mut expr = String::new();
                        for member in &members {
                            let view = self.view(proto_fqn, member);
                            let case_fqn = format!(
                                "{}.{}.{}",
                                scala_fqn,
                                to_upper_camel(oneof.name()),
                                view.name_upper()
                            );
                            expr.push_str(&format!(
                                "if (javaSource.has{}) {}({}) else ",
                                view.name_upper(),
                                case_fqn,
                                self.from_java_single(&view, "javaSource")
                            ));
                        }
                        expr.push_str(&format!(
                            "{}.{}.Empty",
                            scala_fqn,
                            to_upper_camel(oneof.name())
                        ));
                        format!("{} = {}", Self::oneof_accessor(oneof), expr)
                    }
                })
                .collect();
            p.add_sep(args, ",");
        });
        printer.add(")");
    }

    /// Scala element value -> the argument a Java builder setter expects.
    fn scala_to_java_value(&self, view: &FieldView, expr: &str) -> String {
        let base = view.to_base_chain().apply(expr, false);
        match view.field.r#type() {
            Type::Message => format!(
                "{}.toJavaProto({})",
                view.base_single_type(),
                base
            ),
            Type::Enum => {
                if view.syntax() == Syntax::Proto3 {
                    // handled by the Value-suffixed setters at the call site
                    format!("{}.value", base)
                } else {
                    format!(
                        "{}.forNumber({}.value)",
                        self.registry.java_type(view.field.type_name()),
                        base
                    )
                }
            }
            _ => base,
        }
    }

    /// Java getter result -> the stored Scala value.
    fn java_to_scala_value(&self, view: &FieldView, expr: &str) -> String {
        let converted = match view.field.r#type() {
            Type::Message => format!(
                "{}.fromJavaProto({})",
                view.base_single_type(),
                expr
            ),
            Type::Enum => format!(
                "{}.fromValue({}.getNumber)",
                view.base_single_type(),
                expr
            ),
            _ => expr.to_string(),
        };
        view.to_custom_chain().apply(&converted, false)
    }

    /// The builder call setting one element value; proto3 enums go through
    /// the numeric `set*Value` form to preserve unknown values.
    fn java_set_stmt(&self, view: &FieldView, value_expr: &str) -> String {
        let setter = if view.is_enum() && view.syntax() == Syntax::Proto3 {
            format!("set{}Value", view.name_upper())
        } else {
            format!("set{}", view.name_upper())
        };
        format!(
            "javaPbOut.{}({})",
            setter,
            self.scala_to_java_value(view, value_expr)
        )
    }

    /// One element read back from a Java getter; proto3 enums go through
    /// the numeric `get*Value` form.
    fn from_java_single(&self, view: &FieldView, source: &str) -> String {
        let upper = view.name_upper();
        if view.is_enum() && view.syntax() == Syntax::Proto3 {
            view.to_custom_chain().apply(
                &format!(
                    "{}.fromValue({}.get{}Value)",
                    view.base_single_type(),
                    source,
                    upper
                ),
                false,
            )
        } else {
            self.java_to_scala_value(view, &format!("{}.get{}", source, upper))
        }
    }

    fn to_java_stmts(&self, view: &FieldView, source: &str) -> Vec<String> {
        let upper = view.name_upper();
        let acc = format!("{}.{}", source, view.accessor());
        let proto3 = view.syntax() == Syntax::Proto3;
        match view.category() {
            FieldCategory::Singular | FieldCategory::Required => {
                vec![self.java_set_stmt(view, &acc)]
            }
            FieldCategory::Optional => {
                vec![
                    format!("{}.foreach {{ __v =>", acc),
                    format!("  {}", self.java_set_stmt(view, "__v")),
                    "}".to_string(),
                ]
            }
            FieldCategory::Repeated => {
                let (adder, element) = if view.is_enum() && proto3 {
                    (
                        format!("addAll{}Value", upper),
                        format!(
                            "_root_.scala.Int.box({})",
                            self.scala_to_java_value(view, "__e")
                        ),
                    )
                } else {
                    let converted = self.scala_to_java_value(view, "__e");
                    (format!("addAll{}", upper), box_java(view, &converted))
                };
                vec![format!(
                    "javaPbOut.{}({}.map(__e => {}).asJava)",
                    adder, acc, element
                )]
            }
            FieldCategory::Map => {
                let (key, value) = view.map_entry_views().unwrap();
                let key_expr = box_java(&key, &self.scala_to_java_value(&key, "__kv._1"));
                if value.is_enum() && proto3 {
                    let value_expr = format!(
                        "_root_.scala.Int.box({})",
                        self.scala_to_java_value(&value, "__kv._2")
                    );
                    vec![format!(
                        "javaPbOut.putAll{}Value({}.map(__kv => ({}, {})).asJava)",
                        upper, acc, key_expr, value_expr
                    )]
                } else {
                    let value_expr = box_java(&value, &self.scala_to_java_value(&value, "__kv._2"));
                    vec![format!(
                        "javaPbOut.putAll{}({}.map(__kv => ({}, {})).asJava)",
                        upper, acc, key_expr, value_expr
                    )]
                }
            }
            FieldCategory::OneofMember => unreachable!("oneof members handled by the caller"),
        }
    }

    fn from_java_expr(&self, view: &FieldView, source: &str) -> String {
        let upper = view.name_upper();
        let proto3 = view.syntax() == Syntax::Proto3;
        match view.category() {
            FieldCategory::Singular | FieldCategory::Required => {
                self.from_java_single(view, source)
            }
            FieldCategory::Optional => format!(
                "if ({}.has{}) _root_.scala.Some({}) else _root_.scala.None",
                source,
                upper,
                self.from_java_single(view, source)
            ),
            FieldCategory::Repeated => {
                if view.is_enum() && proto3 {
                    let element = view.to_custom_chain().apply(
                        &format!("{}.fromValue(__e.intValue)", view.base_single_type()),
                        false,
                    );
                    format!(
                        "{}.get{}ValueList.asScala.iterator.map(__e => {}).toSeq",
                        source, upper, element
                    )
                } else {
                    let element =
                        self.java_to_scala_value(view, &unbox_java(view, "__e"));
                    format!(
                        "{}.get{}List.asScala.iterator.map(__e => {}).toSeq",
                        source, upper, element
                    )
                }
            }
            FieldCategory::Map => {
                let (key, value) = view.map_entry_views().unwrap();
                let key_expr = self.java_to_scala_value(&key, &unbox_java(&key, "__kv._1"));
                if value.is_enum() && proto3 {
                    let value_expr = value.to_custom_chain().apply(
                        &format!("{}.fromValue(__kv._2.intValue)", value.base_single_type()),
                        false,
                    );
                    format!(
                        "{}.get{}ValueMap.asScala.iterator.map(__kv => ({}, {})).toMap",
                        source, upper, key_expr, value_expr
                    )
                } else {
                    let value_expr =
                        self.java_to_scala_value(&value, &unbox_java(&value, "__kv._2"));
                    format!(
                        "{}.get{}Map.asScala.iterator.map(__kv => ({}, {})).toMap",
                        source, upper, key_expr, value_expr
                    )
                }
            }
            FieldCategory::OneofMember => unreachable!("oneof members handled by the caller"),
        }
    }
}

/// Lift from the stored value to the bare wire value: custom `toBase`
/// first, then `.value` for enums.
fn base_value_chain(view: &FieldView) -> TransformChain {
    let chain = view.to_base_chain();
    if view.is_enum() {
        chain.then(Transform::method("value"))
    } else {
        chain
    }
}

/// The `compute*Size` suffix; enums travel as bare varints once `.value`
/// has been applied.
fn size_suffix(view: &FieldView) -> &'static str {
    match view.field.r#type() {
        Type::Enum => "Enum",
        _ => view.capitalized_type(),
    }
}

fn size_expr(view: &FieldView, value: &str) -> String {
    match view.field.r#type() {
        Type::Message => format!(
            "{}.computeTagSize({}) + {}.computeUInt32SizeNoTag({}.serializedSize) + {}.serializedSize",
            OUTPUT_STREAM,
            view.number(),
            OUTPUT_STREAM,
            value,
            value
        ),
        _ => format!(
            "{}.compute{}Size({}, {})",
            OUTPUT_STREAM,
            size_suffix(view),
            view.number(),
            value
        ),
    }
}

fn write_stmts(view: &FieldView, value: &str) -> Vec<String> {
    match view.field.r#type() {
        Type::Message => vec![
            format!("_output__.writeTag({}, 2)", view.number()),
            format!("_output__.writeUInt32NoTag({}.serializedSize)", value),
            format!("{}.writeTo(_output__)", value),
        ],
        _ => vec![format!(
            "_output__.write{}({}, {})",
            size_suffix(view),
            view.number(),
            value
        )],
    }
}

/// `__value` holds the base (post-`toBase`, post-`.value`) form; compare
/// against the base type's zero.
fn nondefault_guard(view: &FieldView, value: &str) -> String {
    match view.field.r#type() {
        Type::String | Type::Bytes => format!("!{}.isEmpty", value),
        Type::Bool => format!("{} != false", value),
        Type::Enum => format!("{} != 0", value),
        Type::Float => format!("{} != 0.0f", value),
        Type::Double => format!("{} != 0.0", value),
        Type::Int64 | Type::Uint64 | Type::Sint64 | Type::Fixed64 | Type::Sfixed64 => {
            format!("{} != 0L", value)
        }
        _ => format!("{} != 0", value),
    }
}

/// The value `getFieldByNumber` hands to the reflection protocol: base
/// types, `null` for absence, enum value descriptors for enums.
fn reflection_value(view: &FieldView, source: &str, in_oneof: bool) -> String {
    if in_oneof {
        let chain = if view.is_enum() {
            view.to_base_chain()
                .then(Transform::method("javaValueDescriptor"))
        } else {
            view.to_base_chain()
        };
        return format!("{}.orNull", chain.apply(source, true));
    }
    match view.category() {
        FieldCategory::Required => {
            let base = view.to_base_chain().apply(source, false);
            if view.is_enum() {
                format!("{}.javaValueDescriptor", base)
            } else {
                base
            }
        }
        FieldCategory::Singular => {
            let base = view.to_base_chain().apply(source, false);
            if view.is_enum() {
                format!(
                    "{{ val __e = {}; if (__e.value != 0) __e.javaValueDescriptor else null }}",
                    base
                )
            } else {
                format!(
                    "{{ val __t = {}; if ({}) __t else null }}",
                    base,
                    nondefault_guard(view, "__t")
                )
            }
        }
        FieldCategory::Optional => {
            if view.is_enum() {
                let lifted = view
                    .to_base_chain()
                    .then(Transform::method("javaValueDescriptor"))
                    .apply(source, true);
                format!("{}.orNull", lifted)
            } else {
                format!("{}.orNull", view.to_base_chain().apply(source, true))
            }
        }
        FieldCategory::Repeated => {
            if view.is_enum() {
                view.to_base_chain()
                    .then(Transform::method("javaValueDescriptor"))
                    .apply(source, true)
            } else {
                view.to_base_chain().apply(source, true)
            }
        }
        FieldCategory::Map => format!(
            "{}.iterator.map({}.pairMapper.toBase).toSeq",
            source,
            view.map_entry_scala_type()
        ),
        FieldCategory::OneofMember => unreachable!("oneof members pass in_oneof"),
    }
}

/// One constructor argument of `fromFieldsMap` for a regular field.
fn from_fields_entry(view: &FieldView, field_ref: &str) -> String {
    let base_type = view.base_single_type();
    match view.category() {
        FieldCategory::Singular | FieldCategory::Required => {
            if view.is_enum() {
                view.to_custom_chain().apply(
                    &format!(
                        "{}.fromValue(__fieldsMap.getOrElse({}, {}.javaValueDescriptor).asInstanceOf[{}.Descriptors.EnumValueDescriptor].getNumber)",
                        base_type,
                        field_ref,
                        view.base_enum_default_variant(),
                        JAVA_RUNTIME
                    ),
                    false,
                )
            } else {
                view.to_custom_chain().apply(
                    &format!(
                        "__fieldsMap.getOrElse({}, {}).asInstanceOf[{}]",
                        field_ref,
                        view.base_single_default_expr(),
                        base_type
                    ),
                    false,
                )
            }
        }
        FieldCategory::Optional => {
            if view.is_enum() {
                format!(
                    "__fieldsMap.get({}).map(__e => {})",
                    field_ref,
                    view.to_custom_chain().apply(
                        &format!(
                            "{}.fromValue(__e.asInstanceOf[{}.Descriptors.EnumValueDescriptor].getNumber)",
                            base_type, JAVA_RUNTIME
                        ),
                        false
                    )
                )
            } else {
                view.to_custom_chain().apply(
                    &format!(
                        "__fieldsMap.get({}).asInstanceOf[_root_.scala.Option[{}]]",
                        field_ref, base_type
                    ),
                    true,
                )
            }
        }
        FieldCategory::Repeated => {
            if view.is_enum() {
                format!(
                    "__fieldsMap.getOrElse({}, _root_.scala.Seq.empty).asInstanceOf[_root_.scala.Seq[{}.Descriptors.EnumValueDescriptor]].map(__e => {})",
                    field_ref,
                    JAVA_RUNTIME,
                    view.to_custom_chain()
                        .apply(&format!("{}.fromValue(__e.getNumber)", base_type), false)
                )
            } else {
                view.to_custom_chain().apply(
                    &format!(
                        "__fieldsMap.getOrElse({}, _root_.scala.Seq.empty).asInstanceOf[_root_.scala.Seq[{}]]",
                        field_ref, base_type
                    ),
                    true,
                )
            }
        }
        FieldCategory::Map => {
            let entry = view.map_entry_scala_type();
            format!(
                "__fieldsMap.getOrElse({}, _root_.scala.Seq.empty).asInstanceOf[_root_.scala.Seq[{}]].iterator.map({}.pairMapper.toCustom).toMap",
                field_ref, entry, entry
            )
        }
        FieldCategory::OneofMember => unreachable!("handled by from_fields_oneof_member"),
    }
}

fn from_fields_oneof_member(view: &FieldView, field_ref: &str, case_fqn: &str) -> String {
    let base_type = view.base_single_type();
    if view.is_enum() {
        format!(
            "__fieldsMap.get({}).map(__e => {}({}))",
            field_ref,
            case_fqn,
            view.to_custom_chain().apply(
                &format!(
                    "{}.fromValue(__e.asInstanceOf[{}.Descriptors.EnumValueDescriptor].getNumber)",
                    base_type, JAVA_RUNTIME
                ),
                false
            )
        )
    } else {
        format!(
            "__fieldsMap.get({}).asInstanceOf[_root_.scala.Option[{}]].map(__v => {}({}))",
            field_ref,
            base_type,
            case_fqn,
            view.to_custom_chain().apply("__v", false)
        )
    }
}

/// Boxes a Scala primitive for Java collection interop.
fn box_java(view: &FieldView, expr: &str) -> String {
    let boxer = match view.field.r#type() {
        Type::Int32 | Type::Sint32 | Type::Sfixed32 | Type::Uint32 | Type::Fixed32 => {
            Some("_root_.scala.Int.box")
        }
        Type::Int64 | Type::Sint64 | Type::Sfixed64 | Type::Uint64 | Type::Fixed64 => {
            Some("_root_.scala.Long.box")
        }
        Type::Float => Some("_root_.scala.Float.box"),
        Type::Double => Some("_root_.scala.Double.box"),
        Type::Bool => Some("_root_.scala.Boolean.box"),
        _ => None,
    };
    match boxer {
        Some(boxer) => format!("{}({})", boxer, expr),
        None => expr.to_string(),
    }
}

/// Unboxes a Java wrapper coming out of a Java collection.
fn unbox_java(view: &FieldView, expr: &str) -> String {
    let method = match view.field.r#type() {
        Type::Int32 | Type::Sint32 | Type::Sfixed32 | Type::Uint32 | Type::Fixed32 => {
            Some("intValue")
        }
        Type::Int64 | Type::Sint64 | Type::Sfixed64 | Type::Uint64 | Type::Fixed64 => {
            Some("longValue")
        }
        Type::Float => Some("floatValue"),
        Type::Double => Some("doubleValue"),
        Type::Bool => Some("booleanValue"),
        _ => None,
    };
    match method {
        Some(method) => format!("{}.{}", expr, method),
        None => expr.to_string(),
    }
}
