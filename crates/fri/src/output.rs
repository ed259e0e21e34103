use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use fri_client::CycleStats;
use fri_message::{CommandMessage, MonitoringMessage};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct DecodedOutput<'a, M: Serialize> {
    kind: &'a str,
    frame_size: usize,
    joints: usize,
    message: &'a M,
}

pub fn print_monitoring(message: &MonitoringMessage, frame_size: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DecodedOutput {
            kind: "monitoring",
            frame_size,
            joints: message.joint_count().get(),
            message,
        }),
        OutputFormat::Table => print_table(monitoring_rows(message, frame_size)),
        OutputFormat::Pretty => {
            println!(
                "monitoring seq={} reflected={} state={} quality={} measured={} ipo={}",
                message.header.sequence_counter,
                message.header.reflected_sequence_counter,
                message.connection_info.session_state,
                message.connection_info.quality,
                values_or_dash(message.measured_joint_position()),
                values_or_dash(message.ipo_joint_position()),
            );
        }
    }
}

pub fn print_command(message: &CommandMessage, frame_size: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&DecodedOutput {
            kind: "command",
            frame_size,
            joints: message.joint_count().get(),
            message,
        }),
        OutputFormat::Table => print_table(command_rows(message, frame_size)),
        OutputFormat::Pretty => {
            let pose = message
                .data
                .as_ref()
                .and_then(|data| data.cartesian_pose.as_ref())
                .map(|pose| format_values(&pose.0));
            println!(
                "command seq={} reflected={} heartbeat={} pose={}",
                message.header.sequence_counter,
                message.header.reflected_sequence_counter,
                message.is_heartbeat(),
                pose.as_deref().unwrap_or("-"),
            );
        }
    }
}

pub fn print_stats(stats: &CycleStats, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(stats),
        OutputFormat::Table => print_table(vec![
            ("cycles", stats.cycles.to_string()),
            ("commands", stats.commands.to_string()),
            ("heartbeats", stats.heartbeats.to_string()),
            ("decode failures", stats.decode_failures().to_string()),
            ("callback failures", stats.callback_failures.to_string()),
            ("sequence gaps", stats.sequence_gaps.to_string()),
        ]),
        OutputFormat::Pretty => {
            println!(
                "cycles={} commands={} heartbeats={} decode_failures={} callback_failures={} sequence_gaps={}",
                stats.cycles,
                stats.commands,
                stats.heartbeats,
                stats.decode_failures(),
                stats.callback_failures,
                stats.sequence_gaps,
            );
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(rows: Vec<(&'static str, String)>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    println!("{table}");
}

fn monitoring_rows(message: &MonitoringMessage, frame_size: usize) -> Vec<(&'static str, String)> {
    let info = &message.connection_info;
    let mut rows = vec![
        ("frame size", frame_size.to_string()),
        ("sequence", message.header.sequence_counter.to_string()),
        (
            "reflected sequence",
            message.header.reflected_sequence_counter.to_string(),
        ),
        ("session state", info.session_state.to_string()),
        ("quality", info.quality.to_string()),
        (
            "sample time",
            message
                .sample_time()
                .map(|t| format!("{t:?}"))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    if let Some(data) = &message.monitor_data {
        rows.push(("measured position", format_values(&data.measured_joint_position)));
        rows.push(("measured torque", format_values(&data.measured_torque)));
        rows.push(("external torque", format_values(&data.external_torque)));
        if let Some(pose) = &data.measured_cartesian_pose {
            rows.push(("measured pose", format_values(&pose.0)));
        }
    }
    if let Some(ipo) = &message.ipo_data {
        rows.push(("ipo position", format_values(&ipo.joint_position)));
        if let Some(pose) = &ipo.cartesian_pose {
            rows.push(("ipo pose", format_values(&pose.0)));
        }
        rows.push(("overlay", format!("{:?}", ipo.overlay_type)));
    }
    if let Some(robot) = &message.robot_info {
        let drives: Vec<String> = robot.drive_state.iter().map(|d| format!("{d:?}")).collect();
        rows.push(("drive state", drives.join(" ")));
    }
    rows
}

fn command_rows(message: &CommandMessage, frame_size: usize) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("frame size", frame_size.to_string()),
        ("sequence", message.header.sequence_counter.to_string()),
        (
            "reflected sequence",
            message.header.reflected_sequence_counter.to_string(),
        ),
        ("heartbeat", message.is_heartbeat().to_string()),
    ];
    if let Some(data) = &message.data {
        if let Some(position) = &data.joint_position {
            rows.push(("joint position", format_values(position)));
        }
        if let Some(torque) = &data.torque {
            rows.push(("torque", format_values(torque)));
        }
        if let Some(wrench) = &data.wrench {
            rows.push(("wrench", format_values(&wrench.0)));
        }
        if let Some(pose) = &data.cartesian_pose {
            rows.push(("cartesian pose", format_values(&pose.0)));
        }
        if let Some(redundancy) = data.redundancy {
            rows.push(("redundancy", format!("{redundancy:.6}")));
        }
        for io in &data.write_io {
            rows.push(("io write", format!("{}={:?}", io.name, io.value)));
        }
    }
    rows
}

fn format_values(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

fn values_or_dash(values: Option<&[f64]>) -> String {
    values.map(format_values).unwrap_or_else(|| "-".to_string())
}
