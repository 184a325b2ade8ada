use log::debug;
use prost_types::ServiceDescriptorProto;

use super::*;
use crate::ast::{Method, Service};
use crate::ident::{to_lower_camel, to_upper_camel};

impl CodeGenerator<'_> {
    /// Resolves a service descriptor into the AST handed to the external
    /// stub printer.
    pub(super) fn resolve_service(&mut self, service: &ServiceDescriptorProto) -> Service {
        debug!("  service: {:?}", service.name());

        let comments = self.comments_at_path().unwrap_or_default();

        self.push_path(2);
        let methods = service
            .method
            .iter()
            .enumerate()
            .map(|(idx, method)| {
                debug!("    method: {:?}", method.name());
                self.push_path(idx as i32);
                let comments = self.comments_at_path().unwrap_or_default();
                self.pop_path();

                Method {
                    name: to_lower_camel(method.name()),
                    proto_name: method.name().to_string(),
                    comments,
                    input_type: self.registry.scala_type(method.input_type()).to_string(),
                    output_type: self.registry.scala_type(method.output_type()).to_string(),
                    input_proto_type: method.input_type().to_string(),
                    output_proto_type: method.output_type().to_string(),
                    options: method.options.clone().unwrap_or_default(),
                    client_streaming: method.client_streaming(),
                    server_streaming: method.server_streaming(),
                }
            })
            .collect();
        self.pop_path();

        Service {
            name: to_upper_camel(service.name()),
            proto_name: service.name().to_string(),
            package: self.proto_scope.trim_start_matches('.').to_string(),
            comments,
            methods,
            options: service.options.clone().unwrap_or_default(),
        }
    }
}
