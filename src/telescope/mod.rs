pub mod channel;
pub mod telemetry;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::core::types::{ChannelKind, DomeState, Filter, PointingOffset, Target};
use crate::errors::TelescopeError;
use crate::logging::{LogTarget, Logger};
use crate::telescope::channel::{CommandChannel, LocalShell, RemoteShell, SimulatedChannel};
use crate::telescope::telemetry::{require_f64, require_value};

/// Sun altitude (degrees) at or above which the dome stays shut.
pub const SUN_ALTITUDE_LIMIT: f64 = -1.0;
/// Maximum cloud fraction for opening.
pub const CLOUD_LIMIT: f64 = 0.4;
/// Minimum target altitude (degrees) for pointing.
pub const MIN_TARGET_ALTITUDE: f64 = 40.0;
/// Exposure time of every bias frame, in seconds.
pub const BIAS_EXPOSURE_SECS: f64 = 0.5;

/// What to do after a failed shutdown has been reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnUnsafe {
    /// Exit the process with status 2.
    Terminate,
    /// Return to the caller; `Telescope::unsafe_tripped` reports the alarm.
    Report,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrationPolicy {
    pub nodark: bool,
    pub nobias: bool,
}

/// Typed operations on the mount, dome, filter wheel and camera.
///
/// Every action goes through the injected [`CommandChannel`]; nothing in
/// here branches on demo mode.
pub struct Telescope {
    channel: Box<dyn CommandChannel>,
    calibration: CalibrationPolicy,
    offset: Option<PointingOffset>,
    on_unsafe: OnUnsafe,
    unsafe_tripped: AtomicBool,
    logger: Logger,
}

impl Telescope {
    pub fn new(channel: Box<dyn CommandChannel>, logger: Logger) -> Self {
        Self {
            channel,
            calibration: CalibrationPolicy::default(),
            offset: None,
            on_unsafe: OnUnsafe::Terminate,
            unsafe_tripped: AtomicBool::new(false),
            logger,
        }
    }

    /// Telescope wired to the channel named in the configuration.
    pub fn from_config(config: &Config, logger: Logger) -> Self {
        let channel: Box<dyn CommandChannel> = match config.telescope() {
            ChannelKind::Local => Box::new(LocalShell),
            ChannelKind::Remote(host) => Box::new(RemoteShell::new(host.clone())),
            ChannelKind::Demo => Box::new(SimulatedChannel::demo()),
        };
        Self::new(channel, logger)
            .with_calibration(CalibrationPolicy {
                nodark: config.nodark(),
                nobias: config.nobias(),
            })
            .with_offset(config.offset())
    }

    pub fn with_calibration(mut self, calibration: CalibrationPolicy) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_offset(mut self, offset: Option<PointingOffset>) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_unsafe_policy(mut self, on_unsafe: OnUnsafe) -> Self {
        self.on_unsafe = on_unsafe;
        self
    }

    pub fn is_simulated(&self) -> bool {
        self.channel.is_simulated()
    }

    /// Whether a failed shutdown has been reported since construction.
    pub fn unsafe_tripped(&self) -> bool {
        self.unsafe_tripped.load(Ordering::SeqCst)
    }

    fn run(&self, command: &str) -> Result<String, TelescopeError> {
        // Simulated commands are the only record of a demo run.
        if self.is_simulated() {
            self.logger
                .info(format!("[demo] Executing {command}"), LogTarget::ConsoleAndFile);
        } else {
            self.logger
                .info(format!("Executing {command}"), LogTarget::FileOnly);
        }
        self.channel.run(command).inspect_err(|err| {
            self.logger.warn(format!("{err}"), LogTarget::ConsoleAndFile);
        })
    }

    fn run_ok(&self, command: &str) -> bool {
        self.run(command).is_ok()
    }

    // ---- Dome & weather --------------------------------------------------

    pub fn dome_status(&self) -> Result<DomeState, TelescopeError> {
        let out = self.run("tx slit")?;
        let raw = require_value("slit", &out)?;
        DomeState::try_from(raw).map_err(|_| TelescopeError::InvalidTelemetry {
            key: "slit".into(),
            value: raw.to_string(),
        })
    }

    /// Sun well below the horizon, no rain and less than 40% cloud. Any
    /// missing or unreadable telemetry counts as bad weather.
    pub fn weather_ok(&self) -> bool {
        let sun = match self.run("sun").and_then(|out| require_f64("alt", &out)) {
            Ok(alt) => alt,
            Err(err) => {
                self.logger.warn(
                    format!("Unable to read sun altitude ({err}); assuming unsafe."),
                    LogTarget::ConsoleAndFile,
                );
                return false;
            }
        };
        if sun >= SUN_ALTITUDE_LIMIT {
            self.logger.info(
                format!("Sun altitude {sun:.1} is too high to open."),
                LogTarget::ConsoleAndFile,
            );
            return false;
        }

        let weather = self.run("tx taux").and_then(|out| {
            let rain = require_f64("rain", &out)?;
            let cloud = require_f64("cloud", &out)?;
            Ok((rain, cloud))
        });
        match weather {
            Ok((rain, cloud)) => {
                let ok = rain == 0.0 && cloud < CLOUD_LIMIT;
                if !ok {
                    self.logger.info(
                        format!("Weather not suitable (rain={rain}, cloud={cloud})."),
                        LogTarget::ConsoleAndFile,
                    );
                }
                ok
            }
            Err(err) => {
                self.logger.warn(
                    format!("Unable to read weather ({err}); assuming unsafe."),
                    LogTarget::ConsoleAndFile,
                );
                false
            }
        }
    }

    /// Opens the slit and starts tracking. Already-open domes are left alone.
    pub fn open_dome(&self) -> bool {
        match self.dome_status() {
            Ok(DomeState::Open) => return true,
            Ok(DomeState::Closed) => {}
            Err(err) => self.logger.warn(
                format!("Dome state unknown ({err}); attempting to open."),
                LogTarget::ConsoleAndFile,
            ),
        }

        if !self.weather_ok() {
            return false;
        }
        self.logger.info("Opening dome...", LogTarget::ConsoleAndFile);
        self.run_ok("openup nocloud && keepopen maxtime=20000 slit && track on")
    }

    /// Closes the dome and logs out. Safe to call repeatedly.
    ///
    /// A failure here leaves the dome in an unknown, possibly open, state:
    /// the operator is alerted and, under `OnUnsafe::Terminate`, the process
    /// exits.
    pub fn close_dome(&self) -> bool {
        self.logger.info("Closing dome...", LogTarget::ConsoleAndFile);
        if self.run_ok("closedown && logout") {
            return true;
        }

        self.unsafe_tripped.store(true, Ordering::SeqCst);
        self.logger.error(
            "FAILED TO CLOSE THE DOME. The dome may still be open!",
            LogTarget::ConsoleAndFile,
        );
        self.logger.error(
            "Please manually close the dome by running `closedown` and `logout`.",
            LogTarget::ConsoleAndFile,
        );
        if self.on_unsafe == OnUnsafe::Terminate {
            std::process::exit(2);
        }
        false
    }

    // ---- Pointing --------------------------------------------------------

    /// Altitude of `target` is at least 40 degrees.
    pub fn target_visible(&self, target: &Target) -> bool {
        let cmd = match target {
            Target::Catalog(name) => format!("catalog {name} | altaz"),
            Target::Coordinates { ra, dec, equinox } => {
                format!("altaz ra={ra} dec={dec} equinox={equinox}")
            }
        };
        match self.run(&cmd).and_then(|out| require_f64("alt", &out)) {
            Ok(alt) => {
                if alt < MIN_TARGET_ALTITUDE {
                    self.logger.info(
                        format!("{target} is at altitude {alt:.1}, below {MIN_TARGET_ALTITUDE}."),
                        LogTarget::ConsoleAndFile,
                    );
                }
                alt >= MIN_TARGET_ALTITUDE
            }
            Err(_) => false,
        }
    }

    pub fn goto_target(&self, target: &Target) -> bool {
        if !self.target_visible(target) {
            return false;
        }
        let cmd = match target {
            Target::Catalog(name) => format!("catalog {name} | dopoint"),
            Target::Coordinates { ra, dec, equinox } => {
                format!("tx point ra={ra} dec={dec} equinox={equinox}")
            }
        };
        self.run_ok(&cmd)
    }

    pub fn enable_tracking(&self) -> bool {
        self.run_ok("tx track on")
    }

    /// Applies the configured pointing offset; succeeds trivially without one.
    pub fn offset(&self) -> bool {
        match self.offset {
            Some(PointingOffset { ra, dec }) => {
                self.run_ok(&format!("tx offset dec={dec} ra={ra} cos"))
            }
            None => true,
        }
    }

    // ---- Filters & camera ------------------------------------------------

    pub fn current_filter(&self) -> Result<String, TelescopeError> {
        Ok(self.run("pfilter")?.trim().to_string())
    }

    pub fn change_filter(&self, filter: &Filter) -> bool {
        self.run_ok(&format!("pfilter {}", filter.wheel_position()))
    }

    pub fn take_exposure(&self, filename: &str, exposure_time: f64, binning: u32) -> bool {
        let ok = self.run_ok(&format!(
            "image time={exposure_time} bin={binning} outfile={filename}.fits"
        ));
        if ok {
            self.logger
                .info(format!("Saved exposure frame to {filename}"), LogTarget::ConsoleAndFile);
        }
        ok
    }

    pub fn take_dark(&self, filename: &str, exposure_time: f64, binning: u32) -> bool {
        if self.calibration.nodark {
            return true;
        }
        let ok = self.run_ok(&format!(
            "image time={exposure_time} bin={binning} dark outfile={filename}_dark.fits"
        ));
        if ok {
            self.logger
                .info(format!("Saved dark frame to {filename}"), LogTarget::ConsoleAndFile);
        }
        ok
    }

    pub fn take_bias(&self, filename: &str, binning: u32) -> bool {
        if self.calibration.nobias {
            return true;
        }
        let ok = self.run_ok(&format!(
            "image time={BIAS_EXPOSURE_SECS} bin={binning} outfile={filename}_bias.fits"
        ));
        if ok {
            self.logger
                .info(format!("Saved bias frame to {filename}"), LogTarget::ConsoleAndFile);
        }
        ok
    }
}

impl std::fmt::Debug for Telescope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telescope")
            .field("simulated", &self.is_simulated())
            .field("calibration", &self.calibration)
            .field("offset", &self.offset)
            .field("on_unsafe", &self.on_unsafe)
            .finish()
    }
}
