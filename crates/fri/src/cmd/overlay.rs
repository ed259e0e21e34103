use std::f64::consts::{PI, TAU};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fri_client::{CallbackError, ClientCallbacks, ClientConfig, CycleRunner, StepOutcome};
use fri_message::{CommandMessage, MonitoringMessage, SessionState};
use fri_transport::{UdpConfig, UdpTransport};
use tracing::{debug, info};

use crate::cmd::OverlayArgs;
use crate::exit::{client_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_stats, OutputFormat};

/// Assumed cycle time when the controller does not report its send period.
const DEFAULT_SAMPLE_TIME: Duration = Duration::from_millis(5);

const REDUNDANCY_LIMIT: f64 = 45.0 * PI / 180.0;
const REDUNDANCY_STEP: f64 = 0.1 * PI / 180.0;

/// Superimposes a filtered circular offset on the interpolated Cartesian
/// pose (x on sine, y on cosine) and sweeps the redundancy value between
/// -45 and +45 degrees.
#[derive(Debug)]
pub struct CartesianOverlay {
    freq_hz: f64,
    amplitude: f64,
    filter_coeff: f64,
    offset_sin: f64,
    offset_cos: f64,
    phi: f64,
    step_width: Option<f64>,
    redundancy: f64,
    increase: bool,
}

impl CartesianOverlay {
    pub fn new(freq_hz: f64, amplitude: f64, filter_coeff: f64) -> Self {
        Self {
            freq_hz,
            amplitude,
            filter_coeff,
            offset_sin: 0.0,
            offset_cos: 0.0,
            phi: 0.0,
            step_width: None,
            redundancy: 0.0,
            increase: true,
        }
    }

    fn filter(&self, previous: f64, target: f64) -> f64 {
        previous * self.filter_coeff + target * (1.0 - self.filter_coeff)
    }

    fn advance_phase(&mut self) -> (f64, f64) {
        self.offset_sin = self.filter(self.offset_sin, self.amplitude * self.phi.sin());
        self.offset_cos = self.filter(self.offset_cos, self.amplitude * self.phi.cos());

        self.phi += self.step_width.unwrap_or(0.0);
        if self.phi >= TAU {
            self.phi -= TAU;
        }
        (self.offset_sin, self.offset_cos)
    }

    // One step per cycle toward the current limit; the limit flips once reached.
    fn sweep_redundancy(&mut self) -> f64 {
        if self.increase {
            if self.redundancy < REDUNDANCY_LIMIT {
                self.redundancy += REDUNDANCY_STEP;
            } else {
                self.increase = false;
            }
        } else if self.redundancy > -REDUNDANCY_LIMIT {
            self.redundancy -= REDUNDANCY_STEP;
        } else {
            self.increase = true;
        }
        self.redundancy
    }
}

impl ClientCallbacks for CartesianOverlay {
    fn on_state_change(
        &mut self,
        _old: SessionState,
        new: SessionState,
    ) -> Result<(), CallbackError> {
        if new == SessionState::MonitoringReady {
            self.offset_sin = 0.0;
            self.offset_cos = 0.0;
            self.phi = 0.0;
            self.step_width = None;
        }
        Ok(())
    }

    fn on_monitor(&mut self, message: &MonitoringMessage) -> Result<(), CallbackError> {
        if self.step_width.is_none() {
            let sample_time = message.sample_time().unwrap_or(DEFAULT_SAMPLE_TIME);
            self.step_width = Some(TAU * self.freq_hz * sample_time.as_secs_f64());
        }

        let Some(data) = &message.monitor_data else {
            return Ok(());
        };
        if message.session_state().is_monitoring() {
            if let Some(redundancy) = data.measured_redundancy {
                self.redundancy = redundancy;
            }
        }
        if let Some(pose) = &data.measured_cartesian_pose {
            let [x, y, z] = pose.translation();
            debug!(x, y, z, "base to tcp pose");
        }
        Ok(())
    }

    fn on_command(
        &mut self,
        message: &MonitoringMessage,
        command: &mut CommandMessage,
    ) -> Result<(), CallbackError> {
        let mut pose = *message
            .ipo_cartesian_pose()
            .ok_or("interpolated Cartesian pose missing")?;
        let (offset_sin, offset_cos) = self.advance_phase();
        pose.0[0] += offset_sin;
        pose.0[1] += offset_cos;

        let redundancy = self.sweep_redundancy();
        command.set_cartesian_pose(pose, Some(redundancy));
        Ok(())
    }
}

pub fn run(args: OverlayArgs, format: OutputFormat) -> CliResult<i32> {
    if !(0.0..1.0).contains(&args.filter_coeff) {
        return Err(CliError::new(
            USAGE,
            format!("--filter-coeff must be in [0, 1), got {}", args.filter_coeff),
        ));
    }
    let receive_timeout = parse_duration(&args.receive_timeout)?;

    let transport = UdpTransport::with_config(UdpConfig {
        bind_addr: args.bind,
        controller_addr: args.controller,
        receive_timeout: Some(receive_timeout),
        ..UdpConfig::default()
    })
    .map_err(|err| transport_error("bind failed", err))?;

    let callbacks = CartesianOverlay::new(args.freq_hz, args.amplitude, args.filter_coeff);
    let config = ClientConfig {
        joint_count: args.joints,
        ..ClientConfig::default()
    };
    let mut runner = CycleRunner::new(transport, callbacks, config)
        .map_err(|err| client_error("client setup failed", err))?;

    info!(
        freq_hz = args.freq_hz,
        amplitude = args.amplitude,
        filter_coeff = args.filter_coeff,
        "cartesian overlay ready"
    );

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let stats = match args.cycles {
        None => runner
            .run(&running)
            .map_err(|err| client_error("cycle failed", err))?,
        Some(limit) => {
            let mut received = 0u64;
            while received < limit && running.load(Ordering::SeqCst) {
                let outcome = runner
                    .step()
                    .map_err(|err| client_error("cycle failed", err))?;
                if matches!(outcome, StepOutcome::Dispatched(_)) {
                    received += 1;
                }
            }
            *runner.dispatcher().stats()
        }
    };

    print_stats(&stats, format);
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "s" => Duration::from_secs(value),
        _ => Duration::from_millis(value),
    })
}

#[cfg(test)]
mod tests {
    use fri_message::{CartesianPose, IpoData, JointCount, MonitorData};

    use super::*;

    fn joints() -> JointCount {
        JointCount::new(7).expect("7 joints should be valid")
    }

    fn commanding(pose: CartesianPose) -> MonitoringMessage {
        let mut message = MonitoringMessage::new(joints());
        message.connection_info.session_state = SessionState::CommandingActive;
        message.connection_info.send_period_ms = Some(10);
        let mut ipo = IpoData::new(joints());
        ipo.cartesian_pose = Some(pose);
        message.ipo_data = Some(ipo);
        message
    }

    #[test]
    fn step_width_comes_from_sample_time() {
        let mut overlay = CartesianOverlay::new(0.5, 1.0, 0.0);
        overlay
            .on_state_change(SessionState::MonitoringWait, SessionState::MonitoringReady)
            .unwrap();
        overlay
            .on_monitor(&commanding(CartesianPose::default()))
            .unwrap();
        let expected = TAU * 0.5 * 0.01;
        assert!((overlay.step_width.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn unfiltered_offset_follows_sine_and_cosine() {
        let base = CartesianPose([100.0, 200.0, 300.0, 1.0, 0.0, 0.0, 0.0]);
        let message = commanding(base);
        let mut overlay = CartesianOverlay::new(0.25, 2.0, 0.0);
        overlay.on_monitor(&message).unwrap();

        let mut command = CommandMessage::new(joints());
        overlay.on_command(&message, &mut command).unwrap();
        let pose = command.data.unwrap().cartesian_pose.unwrap();
        assert_eq!(pose.0[0], 100.0);
        assert_eq!(pose.0[1], 202.0);
        assert_eq!(pose.0[2], 300.0);
        assert_eq!(&pose.0[3..], &base.0[3..]);
    }

    #[test]
    fn filter_smooths_toward_target() {
        let message = commanding(CartesianPose::default());
        let mut overlay = CartesianOverlay::new(0.25, 1.0, 0.9);
        overlay.on_monitor(&message).unwrap();

        let mut command = CommandMessage::new(joints());
        overlay.on_command(&message, &mut command).unwrap();
        let pose = command.data.unwrap().cartesian_pose.unwrap();
        assert!((pose.0[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn redundancy_sweeps_between_limits() {
        let mut overlay = CartesianOverlay::new(0.25, 1.0, 0.9);
        let mut max = f64::MIN;
        let mut min = f64::MAX;
        for _ in 0..3000 {
            let value = overlay.sweep_redundancy();
            max = max.max(value);
            min = min.min(value);
        }
        assert!(max >= REDUNDANCY_LIMIT && max < REDUNDANCY_LIMIT + REDUNDANCY_STEP);
        assert!(min <= -REDUNDANCY_LIMIT && min > -REDUNDANCY_LIMIT - REDUNDANCY_STEP);
    }

    #[test]
    fn monitoring_adopts_measured_redundancy() {
        let mut message = MonitoringMessage::new(joints());
        message.connection_info.session_state = SessionState::MonitoringReady;
        let mut data = MonitorData::new(joints());
        data.measured_redundancy = Some(0.3);
        message.monitor_data = Some(data);

        let mut overlay = CartesianOverlay::new(0.25, 1.0, 0.9);
        overlay.on_monitor(&message).unwrap();
        assert_eq!(overlay.redundancy, 0.3);
    }

    #[test]
    fn command_without_ipo_pose_fails() {
        let mut message = commanding(CartesianPose::default());
        message.ipo_data = None;
        let mut overlay = CartesianOverlay::new(0.25, 1.0, 0.9);
        let mut command = CommandMessage::new(joints());
        assert!(overlay.on_command(&message, &mut command).is_err());
        assert!(command.is_heartbeat());
    }

    #[test]
    fn parse_duration_defaults_to_millis() {
        assert_eq!(parse_duration("250").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert!(parse_duration("0ms").is_err());
        assert!(parse_duration("soon").is_err());
    }
}
