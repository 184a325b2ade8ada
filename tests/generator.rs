//! End-to-end tests driving full `CodeGeneratorRequest`s through the
//! generator and asserting on the emitted Scala.

use prost_types::compiler::CodeGeneratorRequest;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, OneofDescriptorProto,
};

use protoc_gen_scala::{Config, OptionsRegistry, ScalaFileOptions};

fn scalar(name: &str, number: i32, type_: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(type_ as i32),
        ..Default::default()
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .map(|(value_name, number)| EnumValueDescriptorProto {
                name: Some(value_name.to_string()),
                number: Some(*number),
                ..Default::default()
            })
            .collect(),
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

fn request(files: Vec<FileDescriptorProto>, to_generate: &[&str]) -> CodeGeneratorRequest {
    CodeGeneratorRequest {
        file_to_generate: to_generate.iter().map(|name| name.to_string()).collect(),
        proto_file: files,
        ..Default::default()
    }
}

fn run(request: CodeGeneratorRequest) -> prost_types::compiler::CodeGeneratorResponse {
    Config::new().run_plugin(request, OptionsRegistry::default())
}

fn run_with_options(
    request: CodeGeneratorRequest,
    options: OptionsRegistry,
) -> prost_types::compiler::CodeGeneratorResponse {
    Config::new().run_plugin(request, options)
}

fn content<'a>(
    response: &'a prost_types::compiler::CodeGeneratorResponse,
    name: &str,
) -> &'a str {
    response
        .file
        .iter()
        .find(|file| file.name() == name)
        .unwrap_or_else(|| {
            panic!(
                "no output file {:?}; got {:?}",
                name,
                response.file.iter().map(|f| f.name()).collect::<Vec<_>>()
            )
        })
        .content()
}

#[test]
fn proto3_scalar_message() {
    let mut file = proto3_file("m.proto", "t");
    file.message_type
        .push(message("M", vec![scalar("x", 1, Type::Int32)]));
    let response = run(request(vec![file], &["m.proto"]));
    assert_eq!(response.error, None);

    let class = content(&response, "t/m/M.scala");
    assert!(class.contains("package t.m"));
    assert!(class.contains("final case class M("));
    assert!(class.contains("x: _root_.scala.Int = 0"));
    // singular proto3 contributions are guarded by the zero check
    assert!(class.contains("if (__value != 0)"));
    assert!(class.contains("_output__.writeInt32(1, __v)"));
    // tag 1, varint
    assert!(class.contains("case 8 => __x = _input__.readInt32()"));
    assert!(class.contains("case tag => _input__.skipField(tag)"));
    assert!(class.contains("lazy val defaultInstance: _root_.t.m.M = _root_.t.m.M()"));
    assert!(class.contains("__serializedSizeMemoized"));

    // the companion file carries the embedded descriptor
    let file_object = content(&response, "t/m/MProto.scala");
    assert!(file_object.contains("object MProto"));
    assert!(file_object.contains("_root_.protoscala.Encoding.fromBase64"));
    assert!(file_object.contains("Descriptors.FileDescriptor.buildFrom"));
}

#[test]
fn proto2_optional_with_default() {
    let mut file = FileDescriptorProto {
        name: Some("m.proto".to_string()),
        package: Some("t".to_string()),
        ..Default::default()
    };
    let mut x = scalar("x", 1, Type::Int32);
    x.default_value = Some("7".to_string());
    file.message_type.push(message("M", vec![x]));
    let response = run(request(vec![file], &["m.proto"]));
    assert_eq!(response.error, None);

    let class = content(&response, "t/m/M.scala");
    assert!(class.contains("x: _root_.scala.Option[_root_.scala.Int] = _root_.scala.None"));
    assert!(class.contains("def xOrDefault: _root_.scala.Int = x.getOrElse(7)"));
    assert!(class.contains("def hasX: _root_.scala.Boolean = x.isDefined"));
    // presence fields serialize whenever set, with no default comparison
    assert!(class.contains("x.foreach { __item =>"));
}

#[test]
fn packed_repeated_accepts_both_encodings() {
    let mut file = proto3_file("m.proto", "t");
    let mut xs = scalar("xs", 1, Type::Int32);
    xs.label = Some(Label::Repeated as i32);
    file.message_type.push(message("M", vec![xs]));
    let response = run(request(vec![file], &["m.proto"]));
    assert_eq!(response.error, None);

    let class = content(&response, "t/m/M.scala");
    // packed by default in proto3: length-delimited tag plus body size
    assert!(class.contains("_output__.writeTag(1, 2)"));
    assert!(class.contains("_output__.writeUInt32NoTag(__xsPackedSize)"));
    assert!(class.contains("_output__.writeInt32NoTag"));
    // the declared (packed) arm and the alternate element arm both decode
    assert!(class.contains("case 10 => {"));
    assert!(class.contains("case 8 => __xs += _input__.readInt32()"));
    assert!(class.contains("_input__.pushLimit(length)"));
    assert!(class.contains("_input__.popLimit(oldLimit)"));
    // the packed body length is memoised
    assert!(class.contains("__xsPackedSizeMemoized"));
}

#[test]
fn fixed_width_packed_body_is_a_multiplication() {
    let mut file = proto3_file("m.proto", "t");
    let mut xs = scalar("xs", 1, Type::Fixed32);
    xs.label = Some(Label::Repeated as i32);
    file.message_type.push(message("M", vec![xs]));
    let response = run(request(vec![file], &["m.proto"]));

    let class = content(&response, "t/m/M.scala");
    assert!(class.contains("xs.size * 4"));
    assert!(!class.contains("__xsPackedSizeMemoized"));
}

#[test]
fn oneof_sum_type() {
    let mut file = proto3_file("m.proto", "t");
    let mut a = scalar("a", 1, Type::Int32);
    a.oneof_index = Some(0);
    let mut b = scalar("b", 2, Type::String);
    b.oneof_index = Some(0);
    let mut msg = message("M", vec![a, b]);
    msg.oneof_decl.push(OneofDescriptorProto {
        name: Some("k".to_string()),
        ..Default::default()
    });
    file.message_type.push(msg);
    let response = run(request(vec![file], &["m.proto"]));
    assert_eq!(response.error, None);

    let class = content(&response, "t/m/M.scala");
    assert!(class.contains("k: _root_.t.m.M.K = _root_.t.m.M.K.Empty"));
    assert!(class.contains("sealed trait K extends _root_.protoscala.GeneratedOneof"));
    assert!(class.contains("case object Empty extends _root_.t.m.M.K"));
    assert!(class.contains("final case class A(value: _root_.scala.Int) extends _root_.t.m.M.K"));
    assert!(class.contains("override def number: _root_.scala.Int = 1"));
    assert!(class.contains("override def isA: _root_.scala.Boolean = true"));
    // setting a member rewrites the whole oneof slot
    assert!(class.contains("def withA(__v: _root_.scala.Int): _root_.t.m.M = copy(k = _root_.t.m.M.K.A(__v))"));
    assert!(class.contains("def clearK: _root_.t.m.M = copy(k = _root_.t.m.M.K.Empty)"));
    // decode replaces the slot with the newly read variant
    assert!(class.contains("case 8 => __k = _root_.t.m.M.K.A(_input__.readInt32())"));
    assert!(class.contains("case 18 => __k = _root_.t.m.M.K.B(_input__.readStringRequireUtf8())"));
}

#[test]
fn map_field() {
    let mut file = proto3_file("m.proto", "t");
    let mut entry = message(
        "MEntry",
        vec![scalar("key", 1, Type::String), scalar("value", 2, Type::Int32)],
    );
    entry.options = Some(MessageOptions {
        map_entry: Some(true),
        ..Default::default()
    });
    let mut m = FieldDescriptorProto {
        name: Some("m".to_string()),
        number: Some(1),
        label: Some(Label::Repeated as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(".t.M.MEntry".to_string()),
        ..Default::default()
    };
    m.json_name = Some("m".to_string());
    let mut msg = message("M", vec![m]);
    msg.nested_type.push(entry);
    file.message_type.push(msg);
    let response = run(request(vec![file], &["m.proto"]));
    assert_eq!(response.error, None);

    let class = content(&response, "t/m/M.scala");
    assert!(class.contains(
        "m: _root_.scala.collection.immutable.Map[_root_.scala.Predef.String, _root_.scala.Int] = _root_.scala.collection.immutable.Map.empty"
    ));
    // entries ride the wire as nested messages
    assert!(class.contains("val __entry = _root_.t.m.M.MEntry.pairMapper.toBase(__item)"));
    assert!(class.contains(
        "case 10 => __m += _root_.t.m.M.MEntry.pairMapper.toCustom(_root_.protoscala.LiteParser.readMessage(_input__, _root_.t.m.M.MEntry.defaultInstance))"
    ));
    // the synthesized entry gets its TypeMapper
    assert!(class.contains("implicit val pairMapper: _root_.protoscala.TypeMapper[_root_.t.m.M.MEntry, (_root_.scala.Predef.String, _root_.scala.Int)]"));
}

#[test]
fn enum_preserves_unknown_values() {
    let mut file = proto3_file("m.proto", "t");
    file.enum_type
        .push(enumeration("Color", &[("RED", 0), ("GREEN", 1)]));
    let response = run(request(vec![file], &["m.proto"]));
    assert_eq!(response.error, None);

    let enum_src = content(&response, "t/m/Color.scala");
    assert!(enum_src.contains("sealed abstract class Color(val value: _root_.scala.Int, val index: _root_.scala.Int, val name: _root_.scala.Predef.String)"));
    assert!(enum_src.contains("case object RED extends _root_.t.m.Color(0, 0, \"RED\")"));
    assert!(enum_src.contains("case object GREEN extends _root_.t.m.Color(1, 1, \"GREEN\")"));
    assert!(enum_src.contains("final case class Unrecognized(unrecognizedValue: _root_.scala.Int)"));
    assert!(enum_src.contains("case __other => Unrecognized(__other)"));
    assert!(enum_src
        .contains("lazy val values: _root_.scala.Seq[_root_.t.m.Color] = _root_.scala.Seq(RED, GREEN)"));
    assert!(enum_src.contains("override def isRed: _root_.scala.Boolean = true"));
}

#[test]
fn enum_aliases_decode_first_occurrence_only() {
    let mut file = proto3_file("m.proto", "t");
    file.enum_type.push(enumeration(
        "Color",
        &[("RED", 0), ("CRIMSON", 0), ("GREEN", 1)],
    ));
    let response = run(request(vec![file], &["m.proto"]));

    let enum_src = content(&response, "t/m/Color.scala");
    // the alias keeps its case object and values entry
    assert!(enum_src.contains("case object CRIMSON extends _root_.t.m.Color(0, 1, \"CRIMSON\")"));
    assert!(enum_src.contains("_root_.scala.Seq(RED, CRIMSON, GREEN)"));
    // but only the first occurrence decodes
    assert!(enum_src.contains("case 0 => RED"));
    assert!(!enum_src.contains("case 0 => CRIMSON"));
}

#[test]
fn write_to_is_sorted_by_field_number() {
    let mut file = proto3_file("m.proto", "t");
    file.message_type.push(message(
        "M",
        vec![scalar("later", 2, Type::Int32), scalar("first", 1, Type::Int32)],
    ));
    let response = run(request(vec![file], &["m.proto"]));

    let class = content(&response, "t/m/M.scala");
    let write_one = class.find("_output__.writeInt32(1, __v)").unwrap();
    let write_two = class.find("_output__.writeInt32(2, __v)").unwrap();
    assert!(write_one < write_two);
}

#[test]
fn unknown_parameter_is_an_error() {
    let mut file = proto3_file("m.proto", "t");
    file.message_type.push(message("M", vec![]));
    let mut req = request(vec![file], &["m.proto"]);
    req.parameter = Some("java_conversions,bogus".to_string());
    let response = run(req);
    assert!(response.error().contains("unknown generator parameter"));
    assert!(response.file.is_empty());
}

#[test]
fn preamble_requires_single_file() {
    let mut file = proto3_file("m.proto", "t");
    file.message_type.push(message("M", vec![]));
    let options = OptionsRegistry::default().with_file_options(
        "m.proto",
        ScalaFileOptions {
            preamble: vec!["// preamble".to_string()],
            ..Default::default()
        },
    );
    let response = run_with_options(request(vec![file], &["m.proto"]), options);
    assert!(response.error().contains("single_file"));
    assert!(response.file.is_empty());
}

#[test]
fn single_file_mode_bundles_everything() {
    let mut file = proto3_file("m.proto", "t");
    file.message_type
        .push(message("M", vec![scalar("x", 1, Type::Int32)]));
    file.enum_type
        .push(enumeration("Color", &[("RED", 0)]));
    let options = OptionsRegistry::default().with_file_options(
        "m.proto",
        ScalaFileOptions {
            single_file: Some(true),
            preamble: vec!["// generated header".to_string()],
            ..Default::default()
        },
    );
    let response = run_with_options(request(vec![file], &["m.proto"]), options);
    assert_eq!(response.error, None);
    assert_eq!(response.file.len(), 1);

    let bundled = content(&response, "t/m/MProto.scala");
    assert!(bundled.contains("// generated header"));
    assert!(bundled.contains("final case class M("));
    assert!(bundled.contains("sealed abstract class Color"));
    assert!(bundled.contains("object MProto"));
}

#[test]
fn flat_package_drops_file_suffix() {
    let mut file = proto3_file("m.proto", "t");
    file.message_type.push(message("M", vec![]));
    let mut req = request(vec![file], &["m.proto"]);
    req.parameter = Some("flat_package".to_string());
    let response = run(req);
    assert_eq!(response.error, None);
    assert!(response.file.iter().any(|f| f.name() == "t/M.scala"));
}

#[test]
fn package_name_option_overrides_package() {
    let mut file = proto3_file("m.proto", "t");
    file.message_type.push(message("M", vec![]));
    let options = OptionsRegistry::default().with_file_options(
        "m.proto",
        ScalaFileOptions {
            package_name: Some("com.acme.gen".to_string()),
            flat_package: Some(true),
            ..Default::default()
        },
    );
    let response = run_with_options(request(vec![file], &["m.proto"]), options);
    assert_eq!(response.error, None);
    assert!(response.file.iter().any(|f| f.name() == "com/acme/gen/M.scala"));
    let class = content(&response, "com/acme/gen/M.scala");
    assert!(class.contains("package com.acme.gen"));
}

#[test]
fn oneof_name_collision_is_an_error() {
    let mut file = proto3_file("m.proto", "t");
    let mut a = scalar("a", 1, Type::Int32);
    a.oneof_index = Some(0);
    let mut msg = message("M", vec![a]);
    msg.oneof_decl.push(OneofDescriptorProto {
        name: Some("kind".to_string()),
        ..Default::default()
    });
    msg.nested_type.push(message("Kind", vec![]));
    file.message_type.push(msg);
    let response = run(request(vec![file], &["m.proto"]));
    assert!(response.error().contains("conflicts"));
    assert!(response.file.is_empty());
}

#[test]
fn group_fields_are_rejected() {
    let mut file = FileDescriptorProto {
        name: Some("m.proto".to_string()),
        package: Some("t".to_string()),
        ..Default::default()
    };
    file.message_type
        .push(message("M", vec![scalar("g", 1, Type::Group)]));
    let response = run(request(vec![file], &["m.proto"]));
    assert!(response.error().contains("GROUP"));
    assert!(response.file.is_empty());
}

#[test]
fn group_extension_fields_are_rejected() {
    let mut file = FileDescriptorProto {
        name: Some("m.proto".to_string()),
        package: Some("t".to_string()),
        ..Default::default()
    };
    file.message_type.push(message("M", vec![]));
    let mut extension = scalar("g", 100, Type::Group);
    extension.extendee = Some(".t.M".to_string());
    file.extension.push(extension);
    let response = run(request(vec![file], &["m.proto"]));
    assert!(response.error().contains("GROUP"));
    assert!(response.file.is_empty());
}

#[test]
fn missing_dependency_is_an_error() {
    let mut file = proto3_file("m.proto", "t");
    file.dependency.push("absent.proto".to_string());
    let response = run(request(vec![file], &["m.proto"]));
    assert!(response.error().contains("absent.proto"));
    assert!(response.file.is_empty());
}

#[test]
fn dependency_descriptor_is_linked() {
    let mut dep = proto3_file("dep.proto", "d");
    dep.message_type.push(message("D", vec![]));
    let mut file = proto3_file("m.proto", "t");
    file.dependency.push("dep.proto".to_string());
    let mut f = FieldDescriptorProto {
        name: Some("d".to_string()),
        number: Some(1),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(".d.D".to_string()),
        ..Default::default()
    };
    f.json_name = Some("d".to_string());
    file.message_type.push(message("M", vec![f]));
    let response = run(request(vec![dep, file], &["m.proto"]));
    assert_eq!(response.error, None);

    let file_object = content(&response, "t/m/MProto.scala");
    assert!(file_object.contains("_root_.d.dep.DepProto.javaDescriptor"));
    let class = content(&response, "t/m/M.scala");
    // message fields track presence and merge on re-read
    assert!(class.contains("d: _root_.scala.Option[_root_.d.dep.D] = _root_.scala.None"));
    assert!(class.contains(
        "_root_.protoscala.LiteParser.readMessage(_input__, __d.getOrElse(_root_.d.dep.D.defaultInstance))"
    ));
}

#[test]
fn java_conversions_emit_interop_shims() {
    let mut file = proto3_file("m.proto", "t");
    file.enum_type
        .push(enumeration("Color", &[("RED", 0), ("GREEN", 1)]));
    let mut c = scalar("c", 1, Type::Enum);
    c.type_name = Some(".t.Color".to_string());
    file.message_type.push(message("M", vec![c, scalar("x", 2, Type::Int32)]));
    let mut req = request(vec![file], &["m.proto"]);
    req.parameter = Some("java_conversions".to_string());
    let response = run(req);
    assert_eq!(response.error, None);

    // the file's Java outer class name de-conflicts against message `M`
    let class = content(&response, "t/m/M.scala");
    assert!(class.contains("def toJavaProto(scalaSource: _root_.t.m.M): _root_.t.MOuterClass.M"));
    assert!(class.contains("def fromJavaProto(javaSource: _root_.t.MOuterClass.M): _root_.t.m.M"));
    // proto3 enums interop through the numeric value to keep unknowns
    assert!(class.contains("javaPbOut.setCValue"));
    assert!(class.contains("_root_.t.m.Color.fromValue(javaSource.getCValue)"));

    let enum_src = content(&response, "t/m/Color.scala");
    assert!(enum_src.contains("def fromJavaValue(javaSource: _root_.t.MOuterClass.Color): _root_.t.m.Color = fromValue(javaSource.getNumber)"));
}

#[test]
fn single_line_to_string_switches_text_format() {
    let mut file = proto3_file("m.proto", "t");
    file.message_type.push(message("M", vec![]));
    let mut req = request(vec![file.clone()], &["m.proto"]);
    req.parameter = Some("single_line_to_string".to_string());
    let response = run(req);
    let class = content(&response, "t/m/M.scala");
    assert!(class.contains("printToSingleLineUnicodeString(this)"));

    let response = run(request(vec![file], &["m.proto"]));
    let class = content(&response, "t/m/M.scala");
    assert!(class.contains("printToUnicodeString(this)"));
}

#[test]
fn nested_scopes_and_recursion() {
    let mut file = proto3_file("m.proto", "t");
    // message Node { Node next = 1; Kind kind = 2; enum Kind { LEAF = 0; } }
    let mut next = FieldDescriptorProto {
        name: Some("next".to_string()),
        number: Some(1),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(".t.Node".to_string()),
        ..Default::default()
    };
    next.json_name = Some("next".to_string());
    let mut kind = scalar("kind", 2, Type::Enum);
    kind.type_name = Some(".t.Node.Kind".to_string());
    let mut node = message("Node", vec![next, kind]);
    node.enum_type.push(enumeration("Kind", &[("LEAF", 0)]));
    file.message_type.push(node);
    let response = run(request(vec![file], &["m.proto"]));
    assert_eq!(response.error, None);

    let class = content(&response, "t/m/Node.scala");
    // recursive messages go through the companion lookup, not a value-level
    // forward reference
    assert!(class.contains("def messageCompanionForFieldNumber"));
    assert!(class.contains("case 1 => _root_.t.m.Node"));
    assert!(class.contains("def enumCompanionForFieldNumber"));
    assert!(class.contains("case 2 => _root_.t.m.Node.Kind"));
    // nested enum lives in the companion scope
    assert!(class.contains("javaDescriptor.getEnumTypes.get(0)"));
}

#[test]
fn output_order_follows_request_order() {
    let mut a = proto3_file("a.proto", "t");
    a.message_type.push(message("A", vec![]));
    let mut b = proto3_file("b.proto", "t");
    b.message_type.push(message("B", vec![]));
    let response = run(request(vec![a, b], &["b.proto", "a.proto"]));
    assert_eq!(response.error, None);
    let names: Vec<&str> = response.file.iter().map(|f| f.name()).collect();
    let b_pos = names.iter().position(|n| n.starts_with("t/b/")).unwrap();
    let a_pos = names.iter().position(|n| n.starts_with("t/a/")).unwrap();
    assert!(b_pos < a_pos);
}
