//! Derived queries over raw descriptors.
//!
//! Everything the emitters need to know about a message, field or enum that
//! is not literally a descriptor attribute is computed here: target-language
//! names, element and container types, default-value expressions, wire
//! constants, and the custom-type lift chains.

use std::collections::HashMap;

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::expr::{Transform, TransformChain};
use crate::ident::{escape_keyword, field_accessor, file_object_name, file_package_segment, to_lower_camel, to_upper_camel};
use crate::options::OptionsRegistry;
use crate::syntax::Syntax;

pub const WIRETYPE_VARINT: u32 = 0;
pub const WIRETYPE_FIXED64: u32 = 1;
pub const WIRETYPE_LENGTH_DELIMITED: u32 = 2;
pub const WIRETYPE_FIXED32: u32 = 5;

/// Runtime support package referenced by fully qualified name only.
pub const RUNTIME: &str = "_root_.protoscala";
/// Host Java protobuf runtime, likewise referenced by FQN only.
pub const JAVA_RUNTIME: &str = "_root_.com.google.protobuf";

/// What a proto type name resolves to.
#[derive(Debug, Clone)]
enum ResolvedType {
    Message {
        scala_fqn: String,
        java_fqn: String,
        map_entry: Option<Box<(FieldDescriptorProto, FieldDescriptorProto)>>,
    },
    Enum {
        scala_fqn: String,
        java_fqn: String,
        /// Scala FQN of the default case object (first declared value).
        default_variant: String,
    },
}

/// Per-file derived attributes.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub name: String,
    pub syntax: Syntax,
    /// Scala package of everything generated from this file; empty for a
    /// packageless file without options.
    pub target_package: String,
    /// Scala FQN of the per-file companion object.
    pub file_object_fqn: String,
    pub single_file: bool,
    pub preamble: Vec<String>,
    pub imports: Vec<String>,
}

/// Resolves proto identifiers to Scala (and Java) symbols across every file
/// in the request. Built once, immutable during emission.
pub struct TypeRegistry {
    types: HashMap<String, ResolvedType>,
    files: HashMap<String, FileContext>,
    custom_types: OptionsRegistry,
}

impl TypeRegistry {
    pub fn new(
        files: &[FileDescriptorProto],
        flat_package_flag: bool,
        options: OptionsRegistry,
    ) -> TypeRegistry {
        let mut registry = TypeRegistry {
            types: HashMap::new(),
            files: HashMap::new(),
            custom_types: options,
        };

        for file in files {
            let file_options = registry.custom_types.file_options(file.name()).cloned();
            let target_package = target_package(file, flat_package_flag, file_options.as_ref());
            let file_object_fqn = if target_package.is_empty() {
                format!("_root_.{}", file_object_name(file.name()))
            } else {
                format!("_root_.{}.{}", target_package, file_object_name(file.name()))
            };
            registry.files.insert(
                file.name().to_string(),
                FileContext {
                    name: file.name().to_string(),
                    syntax: Syntax::from_declaration(file.syntax.as_deref()),
                    target_package: target_package.clone(),
                    file_object_fqn,
                    single_file: file_options
                        .as_ref()
                        .and_then(|options| options.single_file)
                        .unwrap_or(false),
                    preamble: file_options
                        .as_ref()
                        .map(|options| options.preamble.clone())
                        .unwrap_or_default(),
                    imports: file_options
                        .as_ref()
                        .map(|options| options.import.clone())
                        .unwrap_or_default(),
                },
            );

            let proto_scope = if file.package().is_empty() {
                String::new()
            } else {
                format!(".{}", file.package())
            };
            let scala_scope = if target_package.is_empty() {
                "_root_".to_string()
            } else {
                format!("_root_.{}", target_package)
            };
            let java_scope = java_scope(file);

            for message in &file.message_type {
                registry.add_message(&proto_scope, &scala_scope, &java_scope, message);
            }
            for enum_type in &file.enum_type {
                registry.add_enum(&proto_scope, &scala_scope, &java_scope, enum_type);
            }
        }

        registry
    }

    fn add_message(
        &mut self,
        proto_scope: &str,
        scala_scope: &str,
        java_scope: &str,
        message: &DescriptorProto,
    ) {
        let proto_fqn = format!("{}.{}", proto_scope, message.name());
        let scala_fqn = format!("{}.{}", scala_scope, to_upper_camel(message.name()));
        let java_fqn = format!("{}.{}", java_scope, message.name());

        let map_entry = if message
            .options
            .as_ref()
            .and_then(|options| options.map_entry)
            .unwrap_or(false)
        {
            let key = message.field[0].clone();
            let value = message.field[1].clone();
            assert_eq!("key", key.name());
            assert_eq!("value", value.name());
            Some(Box::new((key, value)))
        } else {
            None
        };

        self.types.insert(
            proto_fqn.clone(),
            ResolvedType::Message {
                scala_fqn: scala_fqn.clone(),
                java_fqn: java_fqn.clone(),
                map_entry,
            },
        );

        for nested in &message.nested_type {
            self.add_message(&proto_fqn, &scala_fqn, &java_fqn, nested);
        }
        for nested in &message.enum_type {
            self.add_enum(&proto_fqn, &scala_fqn, &java_fqn, nested);
        }
    }

    fn add_enum(
        &mut self,
        proto_scope: &str,
        scala_scope: &str,
        java_scope: &str,
        enum_type: &EnumDescriptorProto,
    ) {
        let proto_fqn = format!("{}.{}", proto_scope, enum_type.name());
        let scala_fqn = format!("{}.{}", scala_scope, to_upper_camel(enum_type.name()));
        let default_variant = format!(
            "{}.{}",
            scala_fqn,
            escape_keyword(enum_type.value[0].name().to_string())
        );
        self.types.insert(
            proto_fqn,
            ResolvedType::Enum {
                scala_fqn,
                java_fqn: format!("{}.{}", java_scope, enum_type.name()),
                default_variant,
            },
        );
    }

    pub fn file(&self, file_name: &str) -> &FileContext {
        &self.files[file_name]
    }

    fn resolved(&self, proto_fqn: &str) -> &ResolvedType {
        // protoc always hands out fully qualified type names.
        assert_eq!(".", &proto_fqn[..1], "type name not fully qualified: {}", proto_fqn);
        self.types
            .get(proto_fqn)
            .unwrap_or_else(|| panic!("unresolved type name: {}", proto_fqn))
    }

    /// Scala FQN (`_root_.`-anchored) of a message or enum.
    pub fn scala_type(&self, proto_fqn: &str) -> &str {
        match self.resolved(proto_fqn) {
            ResolvedType::Message { scala_fqn, .. } => scala_fqn,
            ResolvedType::Enum { scala_fqn, .. } => scala_fqn,
        }
    }

    /// Java FQN of a message or enum, for the interop shims.
    pub fn java_type(&self, proto_fqn: &str) -> &str {
        match self.resolved(proto_fqn) {
            ResolvedType::Message { java_fqn, .. } => java_fqn,
            ResolvedType::Enum { java_fqn, .. } => java_fqn,
        }
    }

    pub fn enum_default_variant(&self, proto_fqn: &str) -> &str {
        match self.resolved(proto_fqn) {
            ResolvedType::Enum { default_variant, .. } => default_variant,
            ResolvedType::Message { .. } => panic!("not an enum: {}", proto_fqn),
        }
    }

    /// The synthesized key/value fields when `proto_fqn` names a map entry.
    pub fn map_entry_fields(
        &self,
        proto_fqn: &str,
    ) -> Option<(&FieldDescriptorProto, &FieldDescriptorProto)> {
        match self.resolved(proto_fqn) {
            ResolvedType::Message { map_entry, .. } => {
                map_entry.as_ref().map(|kv| (&kv.0, &kv.1))
            }
            ResolvedType::Enum { .. } => None,
        }
    }

    pub fn field_custom_type(&self, fq_field_name: &str) -> Option<&str> {
        self.custom_types.field_custom_type(fq_field_name)
    }
}

fn target_package(
    file: &FileDescriptorProto,
    flat_package_flag: bool,
    options: Option<&crate::options::ScalaFileOptions>,
) -> String {
    let base = options
        .and_then(|options| options.package_name.clone())
        .unwrap_or_else(|| file.package().to_string());
    let flat = options
        .and_then(|options| options.flat_package)
        .unwrap_or(flat_package_flag);
    if flat {
        base
    } else {
        let segment = file_package_segment(file.name());
        if base.is_empty() {
            segment
        } else {
            format!("{}.{}", base, segment)
        }
    }
}

/// Java scope prefixing every top-level type of the file, as the Java
/// protobuf compiler derives it.
fn java_scope(file: &FileDescriptorProto) -> String {
    let java_package = file
        .options
        .as_ref()
        .and_then(|options| options.java_package.clone())
        .unwrap_or_else(|| file.package().to_string());
    let multiple_files = file
        .options
        .as_ref()
        .and_then(|options| options.java_multiple_files)
        .unwrap_or(false);

    let prefix = if java_package.is_empty() {
        "_root_".to_string()
    } else {
        format!("_root_.{}", java_package)
    };
    if multiple_files {
        return prefix;
    }

    let outer = file
        .options
        .as_ref()
        .and_then(|options| options.java_outer_classname.clone())
        .unwrap_or_else(|| {
            let mut outer = to_upper_camel(&file_package_segment(file.name()));
            let clashes = file
                .message_type
                .iter()
                .map(|message| message.name())
                .chain(file.enum_type.iter().map(|enum_type| enum_type.name()))
                .chain(file.service.iter().map(|service| service.name()))
                .any(|name| name == outer);
            if clashes {
                outer.push_str("OuterClass");
            }
            outer
        });
    format!("{}.{}", prefix, outer)
}

/// Returns `true` if the repeated field type can be packed.
pub fn can_pack(field: &FieldDescriptorProto) -> bool {
    matches!(
        field.r#type(),
        Type::Float
            | Type::Double
            | Type::Int32
            | Type::Int64
            | Type::Uint32
            | Type::Uint64
            | Type::Sint32
            | Type::Sint64
            | Type::Fixed32
            | Type::Fixed64
            | Type::Sfixed32
            | Type::Sfixed64
            | Type::Bool
            | Type::Enum
    )
}

/// The category driving size/write/merge emission, per the dispatch the
/// emitters switch over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldCategory {
    /// proto3 no-presence scalar: written only when != default.
    Singular,
    /// proto2 required: always written.
    Required,
    /// Presence-tracked: proto2 optional, proto3 optional, message fields.
    Optional,
    Repeated,
    Map,
    OneofMember,
}

/// A field seen through the descriptor view: the raw descriptor plus every
/// derived attribute emission needs.
pub struct FieldView<'a> {
    pub field: &'a FieldDescriptorProto,
    registry: &'a TypeRegistry,
    syntax: Syntax,
    /// `.package.Message.field`, the custom-type lookup key.
    fq_field_name: String,
    in_oneof: bool,
}

impl<'a> FieldView<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        syntax: Syntax,
        fq_message_name: &str,
        field: &'a FieldDescriptorProto,
    ) -> FieldView<'a> {
        let in_oneof = field.oneof_index.is_some() && !field.proto3_optional.unwrap_or(false);
        FieldView {
            field,
            registry,
            syntax,
            fq_field_name: format!("{}.{}", fq_message_name, field.name()),
            in_oneof,
        }
    }

    pub fn number(&self) -> i32 {
        self.field.number()
    }

    pub fn is_repeated(&self) -> bool {
        self.field.label == Some(Label::Repeated as i32)
    }

    pub fn is_required(&self) -> bool {
        self.field.label == Some(Label::Required as i32)
    }

    pub fn is_message(&self) -> bool {
        self.field.r#type() == Type::Message
    }

    pub fn is_enum(&self) -> bool {
        self.field.r#type() == Type::Enum
    }

    pub fn is_in_oneof(&self) -> bool {
        self.in_oneof
    }

    pub fn is_map(&self) -> bool {
        self.is_repeated()
            && self.is_message()
            && self
                .registry
                .map_entry_fields(self.field.type_name())
                .is_some()
    }

    /// Presence: proto2 optional/required distinguish unset from default,
    /// as do oneof members and message fields. In proto3 only explicit
    /// `optional` and messages do.
    pub fn supports_presence(&self) -> bool {
        if self.is_repeated() || self.in_oneof {
            return false;
        }
        if self.field.proto3_optional.unwrap_or(false) {
            return true;
        }
        match self.field.r#type() {
            Type::Message => true,
            _ => self.syntax.scalars_track_presence() && self.field.label() == Label::Optional,
        }
    }

    pub fn is_singular(&self) -> bool {
        !self.is_repeated() && !self.supports_presence() && !self.is_required() && !self.in_oneof
    }

    pub fn is_packed(&self) -> bool {
        if !self.is_repeated() || !can_pack(self.field) {
            return false;
        }
        match self.field.options.as_ref().and_then(|options| options.packed) {
            Some(packed) => packed,
            None => self.syntax.packs_by_default(),
        }
    }

    pub fn is_packable(&self) -> bool {
        self.is_repeated() && can_pack(self.field)
    }

    pub fn category(&self) -> FieldCategory {
        if self.in_oneof {
            FieldCategory::OneofMember
        } else if self.is_map() {
            FieldCategory::Map
        } else if self.is_repeated() {
            FieldCategory::Repeated
        } else if self.is_required() {
            FieldCategory::Required
        } else if self.supports_presence() {
            FieldCategory::Optional
        } else {
            FieldCategory::Singular
        }
    }

    pub fn wire_type(&self) -> u32 {
        match self.field.r#type() {
            Type::Double | Type::Fixed64 | Type::Sfixed64 => WIRETYPE_FIXED64,
            Type::Float | Type::Fixed32 | Type::Sfixed32 => WIRETYPE_FIXED32,
            Type::String | Type::Bytes | Type::Message | Type::Group => {
                WIRETYPE_LENGTH_DELIMITED
            }
            _ => WIRETYPE_VARINT,
        }
    }

    /// The tag as it appears on the wire for this field's declared form,
    /// as the signed 32-bit value `readTag` hands back on the JVM.
    pub fn tag(&self) -> i32 {
        let wire_type = if self.is_packed() {
            WIRETYPE_LENGTH_DELIMITED
        } else {
            self.wire_type()
        };
        ((self.number() as u32) << 3 | wire_type) as i32
    }

    /// The tag of the alternate encoding a packable field also accepts.
    pub fn alternate_tag(&self) -> Option<i32> {
        if !self.is_packable() {
            return None;
        }
        let wire_type = if self.is_packed() {
            self.wire_type()
        } else {
            WIRETYPE_LENGTH_DELIMITED
        };
        Some(((self.number() as u32) << 3 | wire_type) as i32)
    }

    /// Byte width of one element when the wire type is fixed-width.
    pub fn fixed_size(&self) -> Option<u32> {
        match self.field.r#type() {
            Type::Double | Type::Fixed64 | Type::Sfixed64 => Some(8),
            Type::Float | Type::Fixed32 | Type::Sfixed32 => Some(4),
            Type::Bool => Some(1),
            _ => None,
        }
    }

    /// The camel-cased, de-conflicted Scala accessor name.
    pub fn accessor(&self) -> String {
        field_accessor(self.field.name())
    }

    /// UpperCamel form used in derived method names (`withX`, `addAllX`).
    pub fn name_upper(&self) -> String {
        to_upper_camel(&to_lower_camel(self.field.name()))
    }

    /// The capitalised wire-method suffix of the underlying runtime
    /// (`writeInt32`, `computeStringSize`, ...).
    pub fn capitalized_type(&self) -> &'static str {
        match self.field.r#type() {
            Type::Double => "Double",
            Type::Float => "Float",
            Type::Int64 => "Int64",
            Type::Uint64 => "UInt64",
            Type::Int32 => "Int32",
            Type::Fixed64 => "Fixed64",
            Type::Fixed32 => "Fixed32",
            Type::Bool => "Bool",
            Type::String => "String",
            Type::Group => "Group",
            Type::Message => "Message",
            Type::Bytes => "Bytes",
            Type::Uint32 => "UInt32",
            Type::Enum => "Enum",
            Type::Sfixed32 => "SFixed32",
            Type::Sfixed64 => "SFixed64",
            Type::Sint32 => "SInt32",
            Type::Sint64 => "SInt64",
        }
    }

    /// Scala type of a single element before any custom mapping.
    pub fn base_single_type(&self) -> String {
        match self.field.r#type() {
            Type::Double => "_root_.scala.Double".to_string(),
            Type::Float => "_root_.scala.Float".to_string(),
            Type::Int32 | Type::Sint32 | Type::Sfixed32 | Type::Uint32 | Type::Fixed32 => {
                "_root_.scala.Int".to_string()
            }
            Type::Int64 | Type::Sint64 | Type::Sfixed64 | Type::Uint64 | Type::Fixed64 => {
                "_root_.scala.Long".to_string()
            }
            Type::Bool => "_root_.scala.Boolean".to_string(),
            Type::String => "_root_.scala.Predef.String".to_string(),
            Type::Bytes => format!("{}.ByteString", JAVA_RUNTIME),
            Type::Enum | Type::Message | Type::Group => {
                self.registry.scala_type(self.field.type_name()).to_string()
            }
        }
    }

    /// The custom Scala type mapped onto this field, if any.
    pub fn custom_type(&self) -> Option<&str> {
        self.registry.field_custom_type(&self.fq_field_name)
    }

    /// Scala type of a single element as stored in the case class.
    pub fn single_type(&self) -> String {
        match self.custom_type() {
            Some(custom) => format!("_root_.{}", custom.trim_start_matches("_root_.")),
            None => self.base_single_type(),
        }
    }

    /// The container type of the case-class parameter.
    pub fn container_type(&self) -> String {
        match self.category() {
            FieldCategory::Singular | FieldCategory::Required => self.single_type(),
            FieldCategory::Optional => format!("_root_.scala.Option[{}]", self.single_type()),
            FieldCategory::Repeated => format!("_root_.scala.Seq[{}]", self.single_type()),
            FieldCategory::Map => {
                let (key, value) = self.map_entry_views().unwrap();
                format!(
                    "_root_.scala.collection.immutable.Map[{}, {}]",
                    key.single_type(),
                    value.single_type()
                )
            }
            FieldCategory::OneofMember => self.single_type(),
        }
    }

    /// Views over the synthesized key/value fields of a map field's entry.
    pub fn map_entry_views(&self) -> Option<(FieldView<'a>, FieldView<'a>)> {
        let (key, value) = self.registry.map_entry_fields(self.field.type_name())?;
        let entry_fqn = self.field.type_name().to_string();
        Some((
            FieldView::new(self.registry, self.syntax, &entry_fqn, key),
            FieldView::new(self.registry, self.syntax, &entry_fqn, value),
        ))
    }

    /// Scala FQN of the map entry message generated for this map field.
    pub fn map_entry_scala_type(&self) -> String {
        self.registry.scala_type(self.field.type_name()).to_string()
    }

    /// D(f) for a single element: the proto2 `default` option when present,
    /// the type's zero/empty otherwise, lifted through `toCustom`.
    pub fn single_default_expr(&self) -> String {
        let base = self.base_single_default_expr();
        self.to_custom_chain().apply(&base, false)
    }

    /// D(f) for a single element before the custom lift, i.e. the base
    /// (wire-facing) default the reflection coercions compare against.
    pub fn base_single_default_expr(&self) -> String {
        if let Some(default) = self.field.default_value.as_deref() {
            return self.proto2_default_expr(default);
        }
        match self.field.r#type() {
            Type::Double => "0.0".to_string(),
            Type::Float => "0.0f".to_string(),
            Type::Int32 | Type::Sint32 | Type::Sfixed32 | Type::Uint32 | Type::Fixed32 => {
                "0".to_string()
            }
            Type::Int64 | Type::Sint64 | Type::Sfixed64 | Type::Uint64 | Type::Fixed64 => {
                "0L".to_string()
            }
            Type::Bool => "false".to_string(),
            Type::String => "\"\"".to_string(),
            Type::Bytes => format!("{}.ByteString.EMPTY", JAVA_RUNTIME),
            Type::Enum => self
                .registry
                .enum_default_variant(self.field.type_name())
                .to_string(),
            Type::Message | Type::Group => format!(
                "{}.defaultInstance",
                self.registry.scala_type(self.field.type_name())
            ),
        }
    }

    fn proto2_default_expr(&self, default: &str) -> String {
        match self.field.r#type() {
            Type::Double => match default {
                "inf" => "_root_.scala.Double.PositiveInfinity".to_string(),
                "-inf" => "_root_.scala.Double.NegativeInfinity".to_string(),
                "nan" => "_root_.scala.Double.NaN".to_string(),
                d => d.to_string(),
            },
            Type::Float => match default {
                "inf" => "_root_.scala.Float.PositiveInfinity".to_string(),
                "-inf" => "_root_.scala.Float.NegativeInfinity".to_string(),
                "nan" => "_root_.scala.Float.NaN".to_string(),
                f => format!("{}f", f),
            },
            Type::Int64 | Type::Sint64 | Type::Sfixed64 | Type::Uint64 | Type::Fixed64 => {
                format!("{}L", default)
            }
            Type::String => format!("\"{}\"", escape_scala_string(default)),
            Type::Bytes => {
                let bytes = unescape_c_escape_string(default);
                format!(
                    "{}.ByteString.copyFrom(_root_.scala.Array[_root_.scala.Byte]({}))",
                    JAVA_RUNTIME,
                    bytes
                        .iter()
                        .map(|b| (*b as i8).to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Type::Enum => format!(
                "{}.{}",
                self.registry.scala_type(self.field.type_name()),
                escape_keyword(default.to_string())
            ),
            _ => default.to_string(),
        }
    }

    /// The enum variant D(f) names, before any custom lift: the proto2
    /// `default` option's value, or the enum's first declared value.
    pub fn base_enum_default_variant(&self) -> String {
        match self.field.default_value.as_deref() {
            Some(default) => format!(
                "{}.{}",
                self.registry.scala_type(self.field.type_name()),
                escape_keyword(default.to_string())
            ),
            None => self
                .registry
                .enum_default_variant(self.field.type_name())
                .to_string(),
        }
    }

    /// The container-level default of the case-class parameter.
    pub fn container_default_expr(&self) -> String {
        match self.category() {
            FieldCategory::Singular | FieldCategory::Required => self.single_default_expr(),
            FieldCategory::Optional => "_root_.scala.None".to_string(),
            FieldCategory::Repeated => "_root_.scala.Seq.empty".to_string(),
            FieldCategory::Map => "_root_.scala.collection.immutable.Map.empty".to_string(),
            FieldCategory::OneofMember => {
                panic!("oneof members have no container default; the group defaults to Empty")
            }
        }
    }

    /// Lift from the stored representation down to the base (wire) value.
    pub fn to_base_chain(&self) -> TransformChain {
        match self.custom_type() {
            Some(custom) => TransformChain::of(Transform::function(format!(
                "_root_.{}.toBase",
                custom.trim_start_matches("_root_.")
            ))),
            None => TransformChain::identity(),
        }
    }

    /// Lift from a decoded base value up to the stored representation.
    pub fn to_custom_chain(&self) -> TransformChain {
        match self.custom_type() {
            Some(custom) => TransformChain::of(Transform::function(format!(
                "_root_.{}.toCustom",
                custom.trim_start_matches("_root_.")
            ))),
            None => TransformChain::identity(),
        }
    }

    /// The `CodedInputStream` read expression for one base element,
    /// including the enum decode but not the custom lift.
    pub fn read_expr(&self, input: &str) -> String {
        match self.field.r#type() {
            Type::Enum => format!(
                "{}.fromValue({}.readEnum())",
                self.registry.scala_type(self.field.type_name()),
                input
            ),
            Type::String => format!("{}.readStringRequireUtf8()", input),
            Type::Group => panic!("group fields are rejected before emission"),
            _ => format!("{}.read{}()", input, self.capitalized_type()),
        }
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }
}

/// Escapes a string for inclusion in a Scala string literal.
pub fn escape_scala_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Based on [`google::protobuf::UnescapeCEscapeString`][1]
/// [1]: https://github.com/google/protobuf/blob/3.3.x/src/google/protobuf/stubs/strutil.cc#L312-L322
pub fn unescape_c_escape_string(s: &str) -> Vec<u8> {
    let src = s.as_bytes();
    let len = src.len();
    let mut dst = Vec::new();

    let mut p = 0;

    while p < len {
        if src[p] != b'\\' {
            dst.push(src[p]);
            p += 1;
        } else {
            p += 1;
            if p == len {
                panic!(
                    "invalid c-escaped default binary value ({}): ends with '\\'",
                    s
                )
            }
            match src[p] {
                b'a' => {
                    dst.push(0x07);
                    p += 1;
                }
                b'b' => {
                    dst.push(0x08);
                    p += 1;
                }
                b'f' => {
                    dst.push(0x0C);
                    p += 1;
                }
                b'n' => {
                    dst.push(0x0A);
                    p += 1;
                }
                b'r' => {
                    dst.push(0x0D);
                    p += 1;
                }
                b't' => {
                    dst.push(0x09);
                    p += 1;
                }
                b'v' => {
                    dst.push(0x0B);
                    p += 1;
                }
                b'\\' => {
                    dst.push(0x5C);
                    p += 1;
                }
                b'?' => {
                    dst.push(0x3F);
                    p += 1;
                }
                b'\'' => {
                    dst.push(0x27);
                    p += 1;
                }
                b'"' => {
                    dst.push(0x22);
                    p += 1;
                }
                b'0'..=b'7' => {
                    let mut octal = 0;
                    for _ in 0..3 {
                        if p < len && src[p] >= b'0' && src[p] <= b'7' {
                            octal = octal * 8 + (src[p] - b'0');
                            p += 1;
                        } else {
                            break;
                        }
                    }
                    dst.push(octal);
                }
                b'x' | b'X' => {
                    if p + 3 > len {
                        panic!(
                            "invalid c-escaped default binary value ({}): incomplete hex value",
                            s
                        )
                    }
                    match u8::from_str_radix(&s[p + 1..p + 3], 16) {
                        Ok(b) => dst.push(b),
                        _ => panic!(
                            "invalid c-escaped default binary value ({}): invalid hex value",
                            &s[p..p + 2]
                        ),
                    }
                    p += 3;
                }
                _ => panic!(
                    "invalid c-escaped default binary value ({}): invalid escape",
                    s
                ),
            }
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::FileOptions;

    fn scalar_field(name: &str, number: i32, type_: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            r#type: Some(type_ as i32),
            ..Default::default()
        }
    }

    fn proto3_file(name: &str, package: &str) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(name.to_string()),
            package: Some(package.to_string()),
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }
    }

    fn registry_for(file: FileDescriptorProto) -> TypeRegistry {
        TypeRegistry::new(&[file], false, OptionsRegistry::default())
    }

    #[test]
    fn test_target_package_suffix() {
        let mut file = proto3_file("my/deep/path.proto", "com.acme");
        file.message_type.push(DescriptorProto {
            name: Some("Widget".to_string()),
            ..Default::default()
        });
        let registry = registry_for(file);
        let ctx = registry.file("my/deep/path.proto");
        assert_eq!(ctx.target_package, "com.acme.path");
        assert_eq!(ctx.file_object_fqn, "_root_.com.acme.path.PathProto");
        assert_eq!(
            registry.scala_type(".com.acme.Widget"),
            "_root_.com.acme.path.Widget"
        );
    }

    #[test]
    fn test_flat_package() {
        let file = proto3_file("p.proto", "com.acme");
        let registry = TypeRegistry::new(&[file], true, OptionsRegistry::default());
        assert_eq!(registry.file("p.proto").target_package, "com.acme");
    }

    #[test]
    fn test_field_categories() {
        let mut file = proto3_file("t.proto", "t");
        let mut message = DescriptorProto {
            name: Some("M".to_string()),
            ..Default::default()
        };
        message.field.push(scalar_field("a", 1, Type::Int32));
        let mut repeated = scalar_field("b", 2, Type::Int32);
        repeated.label = Some(Label::Repeated as i32);
        message.field.push(repeated);
        file.message_type.push(message.clone());
        let registry = registry_for(file);

        let singular = FieldView::new(&registry, Syntax::Proto3, ".t.M", &message.field[0]);
        assert_eq!(singular.category(), FieldCategory::Singular);
        assert!(!singular.supports_presence());
        assert_eq!(singular.container_type(), "_root_.scala.Int");
        assert_eq!(singular.container_default_expr(), "0");
        assert_eq!(singular.tag(), 8);

        let repeated = FieldView::new(&registry, Syntax::Proto3, ".t.M", &message.field[1]);
        assert_eq!(repeated.category(), FieldCategory::Repeated);
        // packed is the proto3 default, so the declared tag is the packed one
        assert!(repeated.is_packed());
        assert_eq!(repeated.tag(), 18);
        assert_eq!(repeated.alternate_tag(), Some(16));
    }

    #[test]
    fn test_proto2_presence_and_default() {
        let mut file = FileDescriptorProto {
            name: Some("t.proto".to_string()),
            package: Some("t".to_string()),
            ..Default::default()
        };
        let mut message = DescriptorProto {
            name: Some("M".to_string()),
            ..Default::default()
        };
        let mut with_default = scalar_field("x", 1, Type::Int32);
        with_default.default_value = Some("7".to_string());
        message.field.push(with_default);
        file.message_type.push(message.clone());
        let registry = registry_for(file);

        let view = FieldView::new(&registry, Syntax::Proto2, ".t.M", &message.field[0]);
        assert_eq!(view.category(), FieldCategory::Optional);
        assert!(view.supports_presence());
        assert_eq!(view.single_default_expr(), "7");
        assert_eq!(view.container_default_expr(), "_root_.scala.None");
        assert_eq!(
            view.container_type(),
            "_root_.scala.Option[_root_.scala.Int]"
        );
    }

    #[test]
    fn test_proto2_string_and_bytes_defaults() {
        let mut file = FileDescriptorProto {
            name: Some("t.proto".to_string()),
            package: Some("t".to_string()),
            ..Default::default()
        };
        let mut message = DescriptorProto {
            name: Some("M".to_string()),
            ..Default::default()
        };
        let mut s = scalar_field("s", 1, Type::String);
        s.default_value = Some("he\"llo".to_string());
        message.field.push(s);
        let mut b = scalar_field("b", 2, Type::Bytes);
        b.default_value = Some("a\\377".to_string());
        message.field.push(b);
        file.message_type.push(message.clone());
        let registry = registry_for(file);

        let s = FieldView::new(&registry, Syntax::Proto2, ".t.M", &message.field[0]);
        assert_eq!(s.single_default_expr(), "\"he\\\"llo\"");
        let b = FieldView::new(&registry, Syntax::Proto2, ".t.M", &message.field[1]);
        assert_eq!(
            b.single_default_expr(),
            "_root_.com.google.protobuf.ByteString.copyFrom(_root_.scala.Array[_root_.scala.Byte](97, -1))"
        );
    }

    #[test]
    fn test_java_scope() {
        let mut file = proto3_file("svc.proto", "com.acme");
        file.options = Some(FileOptions {
            java_package: Some("com.acme.api".to_string()),
            ..Default::default()
        });
        assert_eq!(java_scope(&file), "_root_.com.acme.api.Svc");

        file.options.as_mut().unwrap().java_multiple_files = Some(true);
        assert_eq!(java_scope(&file), "_root_.com.acme.api");
    }

    #[test]
    fn test_java_outer_class_clash() {
        let mut file = proto3_file("widget.proto", "w");
        file.message_type.push(DescriptorProto {
            name: Some("Widget".to_string()),
            ..Default::default()
        });
        assert_eq!(java_scope(&file), "_root_.w.WidgetOuterClass");
    }

    #[test]
    fn test_unescape_c_escape_string() {
        assert_eq!(
            &b"hello world"[..],
            &unescape_c_escape_string("hello world")[..]
        );
        assert_eq!(&b"\0"[..], &unescape_c_escape_string(r"\0")[..]);
        assert_eq!(&[0o012, 0o156], &unescape_c_escape_string(r"\012\156")[..]);
        assert_eq!(&[0x01, 0x02], &unescape_c_escape_string(r"\x01\x02")[..]);
        assert_eq!(
            &b"\0\x01\x07\x08\x0C\n\r\t\x0B\\\'\"\xFE"[..],
            &unescape_c_escape_string(r#"\0\001\a\b\f\n\r\t\v\\\'\"\xfe"#)[..]
        );
    }
}
