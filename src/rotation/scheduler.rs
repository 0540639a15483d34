use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{Rotation, RotationCallback, RotationConfig};
use crate::{Clock, SessionError};

/// Delay before retrying a failed scheduled rotation.
pub const ROTATION_RETRY_BACKOFF: Duration = Duration::from_secs(5 * 60);

impl Rotation {
    /// Creates the rotation and spawns its scheduling loop on the current
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails without spawning anything if there is no running tokio runtime
    /// or if [`Rotation::new`] fails.
    pub fn start(
        config: RotationConfig,
        clock: Arc<dyn Clock>,
        callback: RotationCallback,
    ) -> Result<(Arc<Self>, RotationHandle), SessionError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            SessionError::Configuration("key rotation requires a running tokio runtime".to_owned())
        })?;

        let rotation = Arc::new(Self::new(config, clock, callback)?);
        let (shutdown, signal) = watch::channel(false);
        let task = runtime.spawn(run(Arc::clone(&rotation), signal));

        Ok((
            rotation,
            RotationHandle {
                shutdown,
                task: Some(task),
            },
        ))
    }

    fn delay_until_next(&self) -> Duration {
        match self.next_rotation_at() {
            Ok(at) => (at - self.clock().now()).to_std().unwrap_or(Duration::ZERO),
            Err(_) => ROTATION_RETRY_BACKOFF,
        }
    }
}

/// Controls the background rotation loop.
///
/// Dropping the handle stops the loop. A rotation already in progress always
/// completes; stopping only cancels the ones not yet started.
#[derive(Debug)]
pub struct RotationHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl RotationHandle {
    /// Signals the loop to exit.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stops the loop and waits for the task to exit.
    pub async fn stopped(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!(target: "latchkey::rotation", "msg=\"rotation task ended abnormally\" error=\"{e}\"");
            }
        }
    }
}

impl Drop for RotationHandle {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

async fn run(rotation: Arc<Rotation>, mut shutdown: watch::Receiver<bool>) {
    let mut delay = rotation.delay_until_next();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                log::debug!(target: "latchkey::rotation", "msg=\"rotation loop stopped\"");
                return;
            }
            () = tokio::time::sleep(delay) => {
                let now = rotation.clock().now();
                delay = match rotation.rotate(now) {
                    Ok(()) => rotation.delay_until_next(),
                    Err(e) => {
                        log::error!(
                            target: "latchkey::rotation",
                            "msg=\"key rotation failed\" error=\"{e}\" retry_in_secs={}",
                            ROTATION_RETRY_BACKOFF.as_secs()
                        );
                        ROTATION_RETRY_BACKOFF
                    }
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::SystemClock;

    fn counting_callback() -> (RotationCallback, Arc<Mutex<usize>>) {
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let callback: RotationCallback = Arc::new(move |_, _| {
            *sink.lock().unwrap() += 1;
            Ok(())
        });
        (callback, count)
    }

    #[test]
    fn test_start_requires_runtime() {
        let (callback, count) = counting_callback();
        let result = Rotation::start(RotationConfig::default(), Arc::new(SystemClock), callback);

        assert!(matches!(result, Err(SessionError::Configuration(_))));
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_loop_rotates_before_expiry() {
        let (callback, count) = counting_callback();
        let config = RotationConfig::default()
            .with_expiry(ChronoDuration::seconds(1))
            .with_window(ChronoDuration::milliseconds(700));

        let (rotation, handle) = Rotation::start(config, Arc::new(SystemClock), callback).unwrap();
        let initial = rotation.snapshot().unwrap();

        // first scheduled rotation fires about 300ms in
        tokio::time::sleep(Duration::from_millis(600)).await;

        let current = rotation.snapshot().unwrap();
        assert!(*count.lock().unwrap() >= 2);
        assert_eq!(current.past, initial.present);
        assert_eq!(current.present, initial.future);

        handle.stopped().await;
    }

    #[tokio::test]
    async fn test_stop_ends_loop() {
        let (callback, count) = counting_callback();
        let (_rotation, handle) =
            Rotation::start(RotationConfig::default(), Arc::new(SystemClock), callback).unwrap();

        handle.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(handle.is_finished());
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
