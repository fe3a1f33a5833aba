//! `init` and `check` handlers.

use serde::Serialize;

use webpush_config::{Config, resolve_instance, save_config};
use webpush_core::decode_server_key;

use crate::cli::{GlobalOpts, InitArgs};
use crate::config;
use crate::error::CliError;
use crate::output::{self, Field};

// ── Init ────────────────────────────────────────────────────────────

pub fn init(args: &InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::active_path(global);
    let path_str = path.display().to_string();
    if path.exists() && !args.force {
        return Err(CliError::ConfigExists { path: path_str });
    }

    let starter = Config::starter(&args.id, &args.public_key);
    // Refuse to write a config that would not load.
    resolve_instance(&starter, None)
        .map_err(|err| CliError::from_config(err, &path_str, &["default"]))?;
    save_config(&starter, &path).map_err(|err| CliError::from_config(err, &path_str, &[]))?;

    tracing::info!(path = %path_str, "wrote starter configuration");
    output::print_output(&format!("Wrote {path_str}"), global.quiet);
    Ok(())
}

// ── Check ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[allow(clippy::struct_excessive_bools)]
struct InstanceReport {
    instance: String,
    id: String,
    script_url: String,
    public_key_bytes: usize,
    subscribe_label: String,
    unsubscribe_label: String,
    send_existing_subscription_on_init: bool,
    disable_button_when_unsupported: bool,
    show_tooltip: bool,
}

pub fn check(global: &GlobalOpts) -> Result<(), CliError> {
    let (instance, client) = config::resolve_client(global)?;
    let public_key_bytes = decode_server_key(&client.public_key)
        .map(|key| key.len())
        .unwrap_or_default();

    let report = InstanceReport {
        instance,
        id: client.id.to_string(),
        script_url: client.script_url(),
        public_key_bytes,
        subscribe_label: client.subscribe_label,
        unsubscribe_label: client.unsubscribe_label,
        send_existing_subscription_on_init: client.send_existing_subscription_on_init,
        disable_button_when_unsupported: client.disable_button_when_unsupported,
        show_tooltip: client.show_tooltip,
    };

    let out = output::render_single(
        global.output,
        &report,
        |r| {
            vec![
                Field::new("Instance", &r.instance),
                Field::new("Id", &r.id),
                Field::new("Script URL", &r.script_url),
                Field::new("Public key", format!("{} bytes", r.public_key_bytes)),
                Field::new("Subscribe label", &r.subscribe_label),
                Field::new("Unsubscribe label", &r.unsubscribe_label),
                Field::new("Send existing", r.send_existing_subscription_on_init),
                Field::new("Disable unsupported", r.disable_button_when_unsupported),
                Field::new("Tooltip", r.show_tooltip),
            ]
        },
        |r| format!("{} ok", r.instance),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
