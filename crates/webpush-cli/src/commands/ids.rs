//! `script-url` and `decode-id` handlers.

use serde::Serialize;

use webpush_core::InstanceId;

use crate::cli::{DecodeIdArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Field};

#[derive(Debug, Serialize)]
struct ScriptLocation {
    instance: String,
    id: String,
    script_url: String,
}

pub fn script_url(global: &GlobalOpts) -> Result<(), CliError> {
    let (instance, client) = config::resolve_client(global)?;
    let location = ScriptLocation {
        instance,
        id: client.id.to_string(),
        script_url: client.script_url(),
    };

    let out = output::render_single(
        global.output,
        &location,
        |l| {
            vec![
                Field::new("Instance", &l.instance),
                Field::new("Id", &l.id),
                Field::new("Script URL", &l.script_url),
            ]
        },
        |l| l.script_url.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Debug, Serialize)]
struct DecodedSegment<'a> {
    segment: &'a str,
    id: String,
}

pub fn decode_id(args: &DecodeIdArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let id = InstanceId::from_path_segment(&args.segment)?;
    let decoded = DecodedSegment {
        segment: &args.segment,
        id: id.to_string(),
    };

    let out = output::render_single(
        global.output,
        &decoded,
        |d| {
            vec![
                Field::new("Segment", d.segment),
                Field::new("Id", &d.id),
            ]
        },
        |d| d.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
