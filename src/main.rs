use std::{env, fs};

use anyhow::Context;
use log::{info, warn};
use orchestrator::{TrainErr, TrainReport, TrainerBuilder, specs::TrainerSpec};
use tokio::{signal, task};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .context("usage: flat-orchestra <spec.json>")?;

    let raw = fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?;
    let spec: TrainerSpec = serde_json::from_str(&raw).context("invalid trainer spec")?;

    let mut trainer = TrainerBuilder::new().build(&spec)?;
    let cancel = trainer.cancel_token();
    let stop = spec.stop_condition();

    info!(
        max_iterations = stop.max_iterations;
        "training with target error {:?}", stop.target_error
    );

    let mut training = task::spawn_blocking(move || {
        let result = trainer.train(&stop);
        (result, trainer)
    });

    let (result, trainer) = tokio::select! {
        ret = &mut training => ret?,
        _ = signal::ctrl_c() => {
            warn!("received ctrl-c, cancelling training");
            cancel.cancel();
            training.await?
        }
    };

    let report = match result {
        Ok(report) => report,
        Err(TrainErr::Cancelled(e)) => {
            warn!("training cancelled: {e}");
            TrainReport {
                iterations: trainer.iterations(),
                error: trainer.error(),
                params: trainer.params().to_vec(),
            }
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
