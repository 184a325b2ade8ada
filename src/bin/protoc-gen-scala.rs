use std::io::{Read, Write};

use anyhow::{Context, Result};
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;

use protoc_gen_scala::{Config, OptionsRegistry};

/// protoc plugin entry point: request on stdin, response on stdout. The
/// process exits 0 whether or not the response carries an error string;
/// protoc reports the error to the user.
fn main() -> Result<()> {
    env_logger::init();

    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .context("failed to read CodeGeneratorRequest from stdin")?;

    let request = CodeGeneratorRequest::decode(&*buf)
        .context("failed to decode CodeGeneratorRequest; is this running under protoc?")?;
    // Schema-level options live in extension fields prost-types drops, so
    // they are harvested from the raw bytes.
    let options = OptionsRegistry::from_request_bytes(&buf);

    let response = Config::new().run_plugin(request, options);

    let mut out = Vec::new();
    response
        .encode(&mut out)
        .context("failed to encode CodeGeneratorResponse")?;
    std::io::stdout()
        .write_all(&out)
        .context("failed to write CodeGeneratorResponse to stdout")?;

    Ok(())
}
