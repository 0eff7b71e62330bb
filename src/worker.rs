use crate::error::{RenderError, Result};
use crate::pipeline;
use crate::profile::Profile;
use crate::types::*;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One render request. The answer goes back on `reply`.
pub struct RenderJob {
    pub audio: Arc<DecodedAudio>,
    pub params: RenderParams,
    pub profile: Profile,
    pub reply: Sender<Result<PcmContainer>>,
}

/// Runs renders off the caller's thread.
///
/// A full-length program is tens of millions of sin() calls, so the
/// thread driving the controls hands jobs over here instead.
/// Jobs are processed in arrival order; the thread exits once every
/// `RenderHandle` has been dropped.
pub struct RenderWorker {
    job_rx: Receiver<RenderJob>,
}

impl RenderWorker {
    pub fn new(job_rx: Receiver<RenderJob>) -> Self {
        Self { job_rx }
    }

    /// Spawn a named worker thread and return a handle for submitting jobs.
    pub fn spawn() -> Result<(RenderHandle, JoinHandle<()>)> {
        let (job_tx, job_rx) = bounded::<RenderJob>(16);
        let handle = thread::Builder::new()
            .name("render".into())
            .spawn(move || {
                RenderWorker::new(job_rx).run();
            })?;
        Ok((RenderHandle { job_tx }, handle))
    }

    /// Process jobs until the channel closes. Blocks the calling thread.
    pub fn run(&self) {
        info!("Render worker running");
        let mut job_count: u64 = 0;

        for job in self.job_rx.iter() {
            job_count += 1;
            debug!("Render job #{}: {}", job_count, job.params);
            let result = pipeline::render(&job.audio, &job.params, &job.profile);
            if let Err(e) = &result {
                warn!("Render job #{} failed: {}", job_count, e);
            }
            if job.reply.send(result).is_err() {
                debug!("Render job #{}: requester went away, result dropped", job_count);
            }
        }

        info!("Render worker stopped after {} jobs", job_count);
    }
}

/// Cloneable submission side of a `RenderWorker`.
#[derive(Clone)]
pub struct RenderHandle {
    job_tx: Sender<RenderJob>,
}

impl RenderHandle {
    /// Queue a render. The returned receiver yields exactly one result.
    pub fn submit(
        &self,
        audio: Arc<DecodedAudio>,
        params: RenderParams,
        profile: Profile,
    ) -> Result<Receiver<Result<PcmContainer>>> {
        let (reply, rx) = bounded(1);
        self.job_tx
            .send(RenderJob {
                audio,
                params,
                profile,
                reply,
            })
            .map_err(|_| RenderError::WorkerUnavailable)?;
        Ok(rx)
    }

    /// Queue a render and wait for it.
    pub fn render_blocking(
        &self,
        audio: Arc<DecodedAudio>,
        params: RenderParams,
        profile: Profile,
    ) -> Result<PcmContainer> {
        let rx = self.submit(audio, params, profile)?;
        rx.recv().map_err(|_| RenderError::WorkerUnavailable)?
    }
}

/// Wait for a worker thread to exit. A panic is logged and reported.
pub fn join_worker(join: JoinHandle<()>) -> Result<()> {
    let name = join.thread().name().unwrap_or("unnamed").to_string();
    join.join().map_err(|_| {
        error!("Worker thread '{}' panicked", name);
        RenderError::WorkerUnavailable
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_job_inputs() -> (Arc<DecodedAudio>, RenderParams, Profile) {
        let audio = Arc::new(DecodedAudio::mono(vec![0.2, -0.1, 0.05], 8000).unwrap());
        let profile = Profile::ducked();
        let mut params = profile.params_for(Task::T1);
        params.target_duration_seconds = 1;
        (audio, params, profile)
    }

    #[test]
    fn test_worker_matches_direct_render() {
        let (handle, join) = RenderWorker::spawn().unwrap();
        let (audio, params, profile) = tiny_job_inputs();
        let direct = pipeline::render(&audio, &params, &profile).unwrap();
        let via_worker = handle
            .render_blocking(audio.clone(), params, profile)
            .unwrap();
        assert_eq!(direct, via_worker);
        drop(handle);
        join.join().unwrap();
    }

    #[test]
    fn test_worker_reports_errors() {
        let (handle, join) = RenderWorker::spawn().unwrap();
        let (audio, mut params, profile) = tiny_job_inputs();
        params.base_frequency_hz = -5.0;
        let err = handle.render_blocking(audio, params, profile).unwrap_err();
        assert!(matches!(err, RenderError::ParameterOutOfRange { .. }));
        drop(handle);
        join.join().unwrap();
    }

    #[test]
    fn test_jobs_answered_in_order() {
        let (handle, join) = RenderWorker::spawn().unwrap();
        let (audio, params, profile) = tiny_job_inputs();
        let mut receivers = Vec::new();
        for task in Task::ALL {
            let mut p = params.clone();
            p.task = task;
            receivers.push(handle.submit(audio.clone(), p, profile.clone()).unwrap());
        }
        for rx in receivers {
            let wav = rx.recv().unwrap().unwrap();
            assert_eq!(wav.frames(), 8000);
        }
        drop(handle);
        join.join().unwrap();
    }

    #[test]
    fn test_join_reports_clean_exit_and_panic() {
        let (handle, join) = RenderWorker::spawn().unwrap();
        drop(handle);
        assert!(join_worker(join).is_ok());

        let join = thread::Builder::new()
            .name("render".into())
            .spawn(|| panic!("render thread died"))
            .unwrap();
        assert!(matches!(join_worker(join), Err(RenderError::WorkerUnavailable)));
    }

    #[test]
    fn test_submit_after_worker_exit_fails() {
        let (job_tx, job_rx) = bounded::<RenderJob>(1);
        drop(job_rx);
        let handle = RenderHandle { job_tx };
        let (audio, params, profile) = tiny_job_inputs();
        assert!(matches!(
            handle.submit(audio, params, profile),
            Err(RenderError::WorkerUnavailable)
        ));
    }
}
