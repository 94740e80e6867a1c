//! `plan` and `apply` commands.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use propweave_engine::{
    ConflictPolicy, NotifyOrigin, SynthesisPlan, WeaveError, WeaveOutcome, Weaver, WeaverConfig,
};
use tracing::{info, warn};

use crate::commands::inputs;
use crate::config::Config;

/// Output format for the weaving plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Unknown format: {}. Use 'text' or 'json'", s),
        }
    }
}

/// Options shared by `plan` and `apply`.
pub struct WeaveArgs<'a> {
    pub inputs: &'a [PathBuf],
    pub module: Option<&'a str>,
    pub collect_conflicts: bool,
}

/// Classify the woven module and print the resulting plan.
pub fn plan(config: &Config, args: WeaveArgs<'_>, format: OutputFormat) -> Result<()> {
    let repo = inputs::load_repository(args.inputs, args.module.or(config.module.as_deref()))?;
    let weaver = build_weaver(config, args.collect_conflicts)?;
    let cancel = install_cancel_handler();

    let outcome = report_conflicts(weaver.run_with_cancel(&repo, &cancel))?;
    match format {
        OutputFormat::Text => print!("{}", render_text(&outcome)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}

/// Classify, stamp the accepted types and write the woven module's manifest.
pub fn apply(config: &Config, args: WeaveArgs<'_>, output: &Path) -> Result<()> {
    let module = args.module.or(config.module.as_deref());
    let mut repo = inputs::load_repository(args.inputs, module)?;
    let weaver = build_weaver(config, args.collect_conflicts)?;
    let cancel = install_cancel_handler();

    let outcome = report_conflicts(weaver.weave(&mut repo, &cancel))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    let manifest = repo.manifest_for(repo.module());
    manifest
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        output = %output.display(),
        injected = outcome.injected.len(),
        "woven manifest written"
    );
    println!(
        "Injected {} type(s), {} already notifying; wrote {}",
        outcome.injected.len(),
        outcome.inherited.len(),
        output.display()
    );
    Ok(())
}

fn build_weaver(config: &Config, collect_conflicts: bool) -> Result<Weaver> {
    let mut weaver_config: WeaverConfig = config.weaver.clone();
    if collect_conflicts {
        weaver_config.conflict_policy = ConflictPolicy::CollectAll;
    }
    Ok(Weaver::new(weaver_config)?)
}

/// Ctrl+C trips the flag; the weaver stops at the next subtree boundary.
fn install_cancel_handler() -> Arc<AtomicBool> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %err, "Ctrl+C handler not installed; the run cannot be interrupted");
    }
    cancelled
}

/// Print every conflict as a build error before propagating.
fn report_conflicts(result: Result<WeaveOutcome, WeaveError>) -> Result<WeaveOutcome> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            let conflicts = err.conflicts();
            for conflict in conflicts {
                eprintln!("error[{}]: {}", conflict.reason.code(), conflict.message);
            }
            if !conflicts.is_empty() {
                warn!(conflicts = conflicts.len(), "weaving aborted");
                anyhow::bail!("weaving aborted with {} conflict(s)", conflicts.len());
            }
            Err(err.into())
        }
    }
}

fn render_text(outcome: &WeaveOutcome) -> String {
    let mut out = String::new();

    if outcome.is_empty() {
        out.push_str("Nothing to weave.\n");
        return out;
    }

    for selected in outcome.selected_types() {
        let marker = match selected.origin {
            NotifyOrigin::Inherited => "=",
            NotifyOrigin::Injected => "+",
        };
        out.push_str(&format!(
            "{} {} ({})\n",
            marker,
            selected.name,
            selected.origin.label()
        ));
        for covered in &selected.covered {
            out.push_str(&format!("    {}\n", covered));
        }
    }

    if !outcome.synthesis.is_empty() {
        out.push('\n');
        for plan in &outcome.synthesis {
            out.push_str(&render_synthesis(plan));
        }
    }

    out
}

fn render_synthesis(plan: &SynthesisPlan) -> String {
    let mut out = format!("{}:\n", plan.type_name);
    if let Some(interface) = &plan.add_interface {
        out.push_str(&format!("    implements {}\n", interface));
    }
    out.push_str(&format!("    public event {}\n", plan.event_name));
    out.push_str(&format!(
        "    {} {}(propertyName)\n",
        plan.property_name_invoker.visibility, plan.property_name_invoker.name
    ));
    out.push_str(&format!(
        "    {} {}(eventArgs)\n",
        plan.event_args_invoker.visibility, plan.event_args_invoker.name
    ));
    out
}
