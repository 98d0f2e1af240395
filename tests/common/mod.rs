#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque};

use upstat::{Reader, UPSError};

pub struct Call {
    args: Vec<String>,
    output: Result<String, fn() -> UPSError>,
}

/// Reader replaying scripted `pwrstat` calls in order.
#[derive(Default)]
pub struct FakeReader {
    expected: RefCell<VecDeque<Call>>,
    calls: RefCell<usize>,
}

impl FakeReader {
    pub fn new() -> FakeReader {
        FakeReader::default()
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }

    pub fn assert_no_more_calls(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "{} scripted call(s) were never made",
            self.expected.borrow().len()
        );
    }

    pub fn expect_call(&self, args: &[&str], output: &str) {
        self.expected.borrow_mut().push_back(Call {
            args: args.iter().map(|a| a.to_string()).collect(),
            output: Ok(output.to_string()),
        });
    }

    pub fn expect_failure(&self, args: &[&str], error: fn() -> UPSError) {
        self.expected.borrow_mut().push_back(Call {
            args: args.iter().map(|a| a.to_string()).collect(),
            output: Err(error),
        });
    }

    pub fn expect_status(&self, status: StatusOutput) {
        self.expect_call(&["-status"], &status.render());
    }

    pub fn expect_status_unreachable(&self) {
        self.expect_call(
            &["-status"],
            "
The UPS information shows as following:

    Properties:
        Model Name................... CP1500EPFCLCD
        Firmware Number.............. CR01505B481
        Rating Voltage............... 230 V
        Rating Power................. 900 Watt

    Current UPS status:
        State........................ Lost Communication
        Test Result.................. Passed at 2022/07/21 16:16:42
        Last Power Event............. Blackout at 2022/07/21 15:10:43 for 24 sec.
",
        );
    }

    pub fn expect_config(&self) {
        self.expect_call(
            &["-config"],
            "
Daemon Configuration:

Alarm .............................................. On
Hibernate .......................................... Off
Cloud .............................................. Off

Action for Power Failure:

    Delay time since Power failure ............. 600 sec.
    Run script command ......................... On
    Path of script command ..................... /etc/pwrstatd-powerfail.sh
    Duration of command running ................ 0 sec.
    Enable shutdown system ..................... On

Action for Battery Low:

    Remaining runtime threshold ................ 600 sec.
    Battery capacity threshold ................. 35 %.
    Run script command ......................... On
    Path of command ............................ /etc/pwrstatd-lowbatt.sh
    Duration of command running ................ 0 sec.
    Enable shutdown system ..................... On
",
        );
    }
}

impl Reader for FakeReader {
    fn read(&self, args: &[&str]) -> Result<String, UPSError> {
        let n = {
            let mut calls = self.calls.borrow_mut();
            *calls += 1;
            *calls
        };
        let call = self.expected.borrow_mut().pop_front().unwrap_or_else(|| {
            panic!("FakeReader did not expect call {} with {:?}", n, args)
        });
        assert_eq!(call.args, args, "unexpected arguments for call {}", n);
        call.output.map_err(|error| error())
    }
}

/// Values substituted into a scripted `pwrstat -status` report.
#[derive(Clone)]
pub struct StatusOutput {
    pub state: &'static str,
    pub power_supply: &'static str,
    pub utility_voltage: u32,
    pub output_voltage: u32,
    pub battery_capacity: u32,
    pub remaining_runtime: u32,
    pub load_watts: u32,
    pub rating_power: u32,
    pub line_interaction: &'static str,
    pub test_result: &'static str,
    pub last_power_event: &'static str,
}

impl Default for StatusOutput {
    fn default() -> Self {
        StatusOutput {
            state: "Normal",
            power_supply: "Utility Power",
            utility_voltage: 230,
            output_voltage: 230,
            battery_capacity: 100,
            remaining_runtime: 129,
            load_watts: 9,
            rating_power: 900,
            line_interaction: "None",
            test_result: "Passed at 2022/07/21 16:16:42",
            last_power_event: "Blackout at 2022/07/21 15:10:43 for 24 sec.",
        }
    }
}

impl StatusOutput {
    pub fn render(&self) -> String {
        format!(
            "
The UPS information shows as following:

    Properties:
        Model Name................... CP1500EPFCLCD
        Firmware Number.............. CR0XXXXXXX
        Rating Voltage............... 230 V
        Rating Power................. {rating_power} Watt

    Current UPS status:
        State........................ {state}
        Power Supply by.............. {power_supply}
        Utility Voltage.............. {utility_voltage} V
        Output Voltage............... {output_voltage} V
        Battery Capacity............. {battery_capacity} %
        Remaining Runtime............ {remaining_runtime} min.
        Load......................... {load_watts} Watt({load_percent} %)
        Line Interaction............. {line_interaction}
        Test Result.................. {test_result}
        Last Power Event............. {last_power_event}
",
            rating_power = self.rating_power,
            state = self.state,
            power_supply = self.power_supply,
            utility_voltage = self.utility_voltage,
            output_voltage = self.output_voltage,
            battery_capacity = self.battery_capacity,
            remaining_runtime = self.remaining_runtime,
            load_watts = self.load_watts,
            load_percent = self.load_watts * 100 / self.rating_power,
            line_interaction = self.line_interaction,
            test_result = self.test_result,
            last_power_event = self.last_power_event,
        )
    }
}
