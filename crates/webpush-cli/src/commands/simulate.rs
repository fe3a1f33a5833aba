//! `simulate`: drive the lifecycle against [`MemoryPlatform`] and print
//! every step the page would go through.

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::mpsc;

use webpush_core::{
    ClickOutcome, ClientConfig, LifecycleState, OutboundMessage, Payload, SubscriptionLifecycle,
    UiState,
};
use webpush_platform::{Capabilities, FaultPoint, MemoryPlatform, PermissionState};

use crate::cli::{FaultArg, GlobalOpts, OutputFormat, PermissionAnswer, SimulateArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

type Lifecycle = SubscriptionLifecycle<MemoryPlatform, mpsc::UnboundedSender<OutboundMessage>>;

// ── Step records ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum StepKind {
    Start,
    Click,
    Reload,
}

#[derive(Debug, Serialize)]
struct Step {
    step: StepKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    click: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    state: LifecycleState,
    ui: UiState,
    reports: Vec<OutboundMessage>,
}

impl Step {
    fn observe(
        step: StepKind,
        lifecycle: &Lifecycle,
        reports: &mut mpsc::UnboundedReceiver<OutboundMessage>,
    ) -> Self {
        let mut drained = Vec::new();
        while let Ok(message) = reports.try_recv() {
            drained.push(message);
        }
        Self {
            step,
            click: None,
            outcome: None,
            error: None,
            state: lifecycle.state(),
            ui: lifecycle.ui_state(),
            reports: drained,
        }
    }

    fn with_outcome(mut self, click: u32, outcome: &ClickOutcome) -> Self {
        self.click = Some(click);
        let (label, error) = match outcome {
            ClickOutcome::Ignored => ("ignored", None),
            ClickOutcome::Settled(_) => ("settled", None),
            ClickOutcome::Failed { error, .. } => ("failed", Some(error.to_string())),
        };
        self.outcome = Some(label);
        self.error = error;
        self
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &SimulateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (instance, client) = config::resolve_client(global)?;
    tracing::info!(instance = %instance, id = %client.id, "simulating lifecycle");

    let platform = Arc::new(build_platform(args, &client));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut steps = Vec::new();
    let lifecycle = SubscriptionLifecycle::start(client, Arc::clone(&platform), tx).await;
    steps.push(Step::observe(StepKind::Start, &lifecycle, &mut rx));

    for click in 1..=args.clicks {
        let outcome = lifecycle.click().await;
        let step = Step::observe(StepKind::Click, &lifecycle, &mut rx);
        steps.push(step.with_outcome(click, &outcome));
    }

    if args.reload {
        let acted = lifecycle.reload_worker().await;
        tracing::debug!(acted, "reload signal handled");
        steps.push(Step::observe(StepKind::Reload, &lifecycle, &mut rx));
    }

    let calls = platform.calls();
    tracing::debug!(?calls, "platform calls");

    let out = render(global, &steps)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn build_platform(args: &SimulateArgs, client: &ClientConfig) -> MemoryPlatform {
    let platform = MemoryPlatform::new(Capabilities {
        has_worker_support: !args.no_worker,
        has_push_support: !args.no_push,
    });
    platform.set_permission(match args.permission {
        PermissionAnswer::Granted => PermissionState::Granted,
        PermissionAnswer::Denied => PermissionState::Denied,
        PermissionAnswer::Default => PermissionState::Default,
    });
    platform.set_unsubscribe_result(!args.refuse_unsubscribe);
    if args.existing {
        platform.insert_subscription(
            &client.script_url(),
            MemoryPlatform::sample_subscription("existing"),
        );
    }
    for fault in &args.faults {
        let point = fault_point(*fault);
        platform.fail(point, format!("simulated {point:?} failure"));
    }
    platform
}

const fn fault_point(fault: FaultArg) -> FaultPoint {
    match fault {
        FaultArg::Register => FaultPoint::Register,
        FaultArg::Update => FaultPoint::Update,
        FaultArg::Query => FaultPoint::Query,
        FaultArg::Subscribe => FaultPoint::Subscribe,
        FaultArg::Unsubscribe => FaultPoint::Unsubscribe,
        FaultArg::Prompt => FaultPoint::Prompt,
    }
}

// ── Rendering ───────────────────────────────────────────────────────

fn render(global: &GlobalOpts, steps: &[Step]) -> Result<String, CliError> {
    let lines: Vec<String> = match global.output {
        // One JSON document per line so the output can be streamed.
        OutputFormat::Json | OutputFormat::JsonCompact => steps
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<_, _>>()?,
        OutputFormat::Plain => steps.iter().map(|s| s.state.to_string()).collect(),
        OutputFormat::Table => {
            let color = output::should_color(global.color);
            steps.iter().map(|s| describe(s, color)).collect()
        }
    };
    Ok(lines.join("\n"))
}

fn describe(step: &Step, color: bool) -> String {
    let heading = match (step.step, step.click) {
        (StepKind::Click, Some(n)) => format!("click {n}"),
        (StepKind::Click, None) => "click".to_owned(),
        (StepKind::Start, _) => "start".to_owned(),
        (StepKind::Reload, _) => "reload".to_owned(),
    };
    let state = step.state.to_string();
    let button = format!(
        "[{} {}{}]",
        step.ui.icon,
        step.ui.label,
        if step.ui.enabled { "" } else { ", disabled" }
    );

    let mut line = if color {
        format!("{:<8} {} {}", heading.bold(), state.cyan(), button.dimmed())
    } else {
        format!("{heading:<8} {state} {button}")
    };

    if let Some(outcome) = step.outcome {
        line.push_str(&format!(" ({outcome})"));
    }
    for report in &step.reports {
        let text = match &report.payload {
            Payload::Subscription(sub) => format!("{} {}", report.topic, sub.endpoint),
            Payload::Error(message) => format!("{} {message}", report.topic),
        };
        line.push_str("\n  -> ");
        if color && matches!(report.payload, Payload::Error(_)) {
            line.push_str(&text.red().to_string());
        } else if color {
            line.push_str(&text.green().to_string());
        } else {
            line.push_str(&text);
        }
    }
    line
}
