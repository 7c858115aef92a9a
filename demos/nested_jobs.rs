//! Runs a few nested fake jobs against the interactive renderer.
//!
//! `cargo run --example nested_jobs` draws the live tree; pass `--simple` for
//! line-per-event output instead.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use scopetree::logging::FileSink;
use scopetree::{
    ColorScheme, DrawLoop, InteractiveRenderer, LogLevel, Logger, Pipeline, RendererConfig,
    Result, RuntimeConfig, ScopeHandle, SequenceGenerator, SimpleRenderer,
};

const STEP_DELAY: Duration = Duration::from_millis(150);

fn main() -> Result<()> {
    let simple = std::env::args().any(|arg| arg == "--simple");
    let ids = SequenceGenerator::starting_at(1);

    if simple {
        let renderer = Arc::new(SimpleRenderer::new(std::io::stdout(), ColorScheme::default()));
        let pipeline = Pipeline::spawn(renderer, LogLevel::Info)?;
        run_jobs(&pipeline.root(), &ids);
        return pipeline.join();
    }

    let renderer = Arc::new(InteractiveRenderer::stdout(RendererConfig::default()));
    let mut runtime = RuntimeConfig::default();
    if let Ok(path) = std::env::var("SCOPETREE_LOG") {
        let sink = FileSink::new(path, 1 << 20).map_err(std::io::Error::other)?;
        runtime = runtime.with_logger(Logger::new(sink).with_min_level(LogLevel::Debug));
    }
    let draw = DrawLoop::with_config(Arc::clone(&renderer), runtime).spawn()?;

    let pipeline = Pipeline::spawn(renderer, LogLevel::Info)?;
    let root = pipeline.root();
    run_jobs(&root, &ids);
    root.finish(true);
    draw.join()?;
    drop(root);
    pipeline.join()
}

fn run_jobs(root: &ScopeHandle, ids: &SequenceGenerator) {
    let workers: Vec<_> = (0..3)
        .map(|lane| {
            let root = root.clone();
            let first = ids.next();
            thread::spawn(move || {
                let local = SequenceGenerator::starting_at(first * 100);
                generate_job(&root, &local, 4 + lane);
            })
        })
        .collect();
    for worker in workers {
        if let Err(panic) = worker.join() {
            std::panic::resume_unwind(panic);
        }
    }
}

/// Spawns `depth` steps under a new scope; every third step nests another job.
fn generate_job(parent: &ScopeHandle, ids: &SequenceGenerator, depth: u64) {
    let job = parent.scoped(format!("Job {}", ids.next())).guard();
    for step in 0..depth {
        if step % 3 == 2 && depth > 2 {
            generate_job(&job, ids, depth - 2);
            continue;
        }
        let child = job.bar(format!("Job {}", ids.next()));
        let ticks = 1 + (step + depth) % 4;
        for tick in 1..=ticks {
            thread::sleep(STEP_DELAY);
            let progress = (100 * tick / ticks) as i64;
            child.info(format!("Doing very important work! Completed {progress}/100..."));
            child.set_percentage(progress);
        }
        child.finish(true);
    }
    job.debug(format!("Finished after {depth} steps"));
    job.succeed();
}
