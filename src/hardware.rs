//! The competition robot on a V5 brain.
//!
//! ```ignore
//! use log::LevelFilter;
//! use punchbot::{config::RobotConfig, fs::logger, hardware::Robot};
//! use vexide::prelude::*;
//!
//! #[vexide::main]
//! async fn main(peripherals: Peripherals) {
//!     logger::init(LevelFilter::Info).unwrap_or_else(|e| println!("Logger Error: {e}"));
//!     match Robot::new(peripherals, RobotConfig::default()) {
//!         Ok(robot) => robot.compete().await,
//!         Err(e) => log::error!("Robot Setup Error: {e}"),
//!     }
//! }
//! ```

use log::{error, info};
use vexide::{
    prelude::{Compete, Controller, Direction, Gearset, Motor, Peripherals},
    smart::SmartPort,
    task::spawn,
};

use crate::{
    config::{RobotConfig, SMART_PORTS},
    display::{StatusDisplay, TextPanel, brain::BrainCanvas},
    drivetrain::Differential,
    error::DeviceError,
    opcontrol::{DriverControl, DriverParts},
    peripherals::{
        make_cloneable,
        vex::{BrainClock, SmartMotor},
    },
    puncher::{
        Puncher, PuncherParts,
        angle::AngleTable,
        lift::CapLift,
        task::{PuncherHandle, PuncherTask},
    },
    time::LOOP_INTERVAL,
};

/// The brain's smart ports, each handed out at most once.
struct PortBank([Option<SmartPort>; SMART_PORTS as usize]);

impl PortBank {
    fn take(&mut self, port: u8) -> Result<SmartPort, DeviceError> {
        port.checked_sub(1)
            .and_then(|index| self.0.get_mut(index as usize))
            .ok_or(DeviceError::InvalidPort { port })?
            .take()
            .ok_or(DeviceError::PortInUse { port })
    }

    fn motor(&mut self, port: u8) -> Result<SmartMotor, DeviceError> {
        let port = self.take(port)?;
        Ok(SmartMotor::new(Motor::new(port, Gearset::Green, Direction::Forward)))
    }
}

/// Devices and control loops of the robot.
pub struct Robot {
    driver:  DriverControl<SmartMotor, Controller, TextPanel<BrainCanvas>>,
    puncher: PuncherHandle,
    config:  RobotConfig,
}

impl Robot {
    /// Builds every mechanism and spawns the puncher task.
    ///
    /// # Errors
    ///
    /// Fails before touching any device if the port map names a port that
    /// does not exist or assigns one port twice.
    pub fn new(peripherals: Peripherals, config: RobotConfig) -> Result<Self, DeviceError> {
        config.ports.validate().inspect_err(|e| error!("Port Map Error: {}", e))?;

        let mut bank = PortBank([
            Some(peripherals.port_1),
            Some(peripherals.port_2),
            Some(peripherals.port_3),
            Some(peripherals.port_4),
            Some(peripherals.port_5),
            Some(peripherals.port_6),
            Some(peripherals.port_7),
            Some(peripherals.port_8),
            Some(peripherals.port_9),
            Some(peripherals.port_10),
            Some(peripherals.port_11),
            Some(peripherals.port_12),
            Some(peripherals.port_13),
            Some(peripherals.port_14),
            Some(peripherals.port_15),
            Some(peripherals.port_16),
            Some(peripherals.port_17),
            Some(peripherals.port_18),
            Some(peripherals.port_19),
            Some(peripherals.port_20),
            Some(peripherals.port_21),
        ]);
        let ports = config.ports;
        let intake = make_cloneable(bank.motor(ports.intake)?);
        let lift = CapLift::new(make_cloneable(bank.motor(ports.cap_lift)?), config.lift);
        // Every motor is claimed before the puncher task starts.
        let drivetrain = Differential::with_config(
            make_cloneable([bank.motor(ports.front_left)?, bank.motor(ports.back_left)?]),
            make_cloneable([bank.motor(ports.front_right)?, bank.motor(ports.back_right)?]),
            config.drive,
        );

        let puncher = Puncher::new(
            PuncherParts {
                puncher:  bank.motor(ports.puncher)?,
                adjuster: bank.motor(ports.angle_adjuster)?,
                intake:   intake.clone(),
                lift:     lift.clone(),
            },
            BrainClock,
            config.puncher,
            AngleTable::default(),
        );
        let handle = PuncherHandle::new();
        spawn(PuncherTask::new(puncher, handle.clone()).run()).detach();

        let mut screen = TextPanel::new(BrainCanvas::new(peripherals.display));
        screen.print_line(0, "punchbot");

        let driver = DriverControl::new(
            DriverParts {
                drivetrain,
                intake,
                lift,
                puncher: handle.clone(),
            },
            peripherals.primary_controller,
            screen,
            config.shaping,
            config.intake,
        );

        Ok(Robot {
            driver,
            puncher: handle,
            config,
        })
    }

    pub fn puncher(&self) -> &PuncherHandle { &self.puncher }

    pub fn config(&self) -> &RobotConfig { &self.config }
}

impl Compete for Robot {
    async fn disabled(&mut self) { info!("Robot Disabled"); }

    async fn driver(&mut self) { self.driver.run(&BrainClock, LOOP_INTERVAL).await; }
}
