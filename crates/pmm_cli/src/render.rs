//! Plain-text views of a snapshot for the terminal.

use chrono::DateTime;
use pmm_core::state::ACTIVITY_EPSILON;
use pmm_core::{DecodedMemory, Mode, PressureSample, RingBuffer, Sender, Snapshot};
use pmm_memory::SessionStatus;
use pmm_reasoning::Tone;
use std::fmt::Write;

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const GRID_WIDTH: usize = 32;

pub fn status(snapshot: &Snapshot, status: &SessionStatus) -> String {
    let mut out = String::new();
    let e = &snapshot.emotion;
    let _ = writeln!(
        out,
        "tick {} | {} | {} | stress {}",
        snapshot.tick,
        status.mode,
        if status.running { "RUNNING" } else { "PAUSED" },
        if status.stress { "ON" } else { "OFF" },
    );
    let _ = writeln!(
        out,
        "memory {}/{} slots, {} used, pressure {:.1}% (threshold {:.0}%){}",
        snapshot.memory_capacity,
        status.config.max_mem_slots,
        snapshot.used_slots(),
        snapshot.current_pressure * 100.0,
        status.config.expansion_threshold * 100.0,
        if snapshot.is_expanding { " EXPANDING" } else { "" },
    );
    let _ = writeln!(out, "pressure {}", sparkline(&snapshot.pressure_history));
    let _ = writeln!(
        out,
        "emotion V {:+.2} A {:+.2} D {:+.2} [{}] tone {}",
        e.valence,
        e.arousal,
        e.dominance,
        e.mood(),
        Tone::from_emotion(e),
    );
    let _ = write!(
        out,
        "action {} | value {:+.2}",
        snapshot.last_action, snapshot.value_estimate
    );
    if status.mode == Mode::Training {
        if let Some(m) = &snapshot.training_metrics {
            let _ = write!(
                out,
                "\ntraining step {} loss {:.4} (act {:.2} val {:.2} emo {:.2} ws {:.2})",
                m.step, m.total_loss, m.loss_act, m.loss_val, m.loss_emo, m.loss_ws
            );
        }
    }
    out
}

/// One character per slot, shaded by usage.
pub fn slots(snapshot: &Snapshot) -> String {
    snapshot
        .memory_slots
        .chunks(GRID_WIDTH)
        .enumerate()
        .map(|(row, chunk)| {
            let cells: String = chunk.iter().map(|u| shade(*u)).collect();
            format!("0x{:04X} {}", row * GRID_WIDTH, cells)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn shade(usage: f32) -> char {
    match usage {
        u if u <= ACTIVITY_EPSILON => '·',
        u if u < 0.4 => '░',
        u if u < 0.7 => '▒',
        u if u < 0.9 => '▓',
        _ => '█',
    }
}

pub fn sparkline(history: &RingBuffer<PressureSample>) -> String {
    history
        .iter()
        .map(|s| {
            let level = (s.pressure.clamp(0.0, 1.0) * (SPARK.len() - 1) as f32).round() as usize;
            SPARK[level.min(SPARK.len() - 1)]
        })
        .collect()
}

pub fn logs(snapshot: &Snapshot) -> String {
    snapshot
        .logs
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn chat(snapshot: &Snapshot) -> String {
    snapshot
        .chat_history
        .iter()
        .map(|m| {
            let time = DateTime::from_timestamp_millis(m.timestamp)
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "--:--:--".to_string());
            let who = match m.sender {
                Sender::User => "USER",
                Sender::Ai => "CORTEX",
                Sender::System => "SYSTEM",
            };
            format!("[{time}] {who}: {}", m.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn decoded(index: usize, memory: &DecodedMemory) -> String {
    let vector = memory
        .vector
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "slot 0x{index:04X} {} [{} / {}] confidence {:.0}% age {}t\n  vector [{vector}]",
        memory.kind,
        memory.concepts[0],
        memory.concepts[1],
        memory.confidence * 100.0,
        memory.age,
    )
}
