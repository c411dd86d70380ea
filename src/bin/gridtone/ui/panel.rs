//! Transport bar and parameter panel widgets.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::ParamsMirror;

/// Audio statistics for display.
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer.
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

/// Render the transport bar: tempo, scale, mode and output level.
pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    mirror: &ParamsMirror,
    stats: &AudioStats,
    sample_rate: f32,
) {
    let block = Block::default().title(" gridtone ").borders(Borders::ALL);

    let mode = if mirror.arp_on { "arpeggio" } else { "chord" };
    let line = Line::from(vec![
        Span::styled(
            format!(" tempo {:.0}  ", mirror.params.tempo),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{}  ", mirror.params.scale.display_name()),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("{mode}  "),
            Style::default().fg(if mirror.arp_on {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::raw(format!("{:.0}kHz  ", sample_rate / 1000.0)),
        Span::styled(
            format!("peak {:.2} rms {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Render the parameter panel.
pub fn render_params(frame: &mut Frame, area: Rect, mirror: &ParamsMirror) {
    let block = Block::default().title(" params ").borders(Borders::ALL);

    let p = &mirror.params;
    let rows = vec![
        row("main osc  w", p.main_osc.waveform.name()),
        row("sub osc   W", p.sub_osc.waveform.name()),
        row("glide     g", &format!("{:.0} ms", p.glide_ms)),
        row(
            "portamento p",
            if p.portamento { "on" } else { "off" },
        ),
        row("scale   1-5", p.scale.display_name()),
        Line::raw(""),
        row("cutoff  [ ]", &format!("{:.0} Hz", mirror.filter_cutoff)),
        row("reso    r R", &format!("{:.1}", mirror.filter_resonance)),
        row("delay   d D", &format!("{:.2}", mirror.delay_amount)),
        row(
            "feedbck f F",
            &format!("{:.0}%", mirror.delay_feedback_pct),
        ),
        row("reverb  v V", &format!("{:.0}%", mirror.reverb_pct)),
        row("volume  - =", &format!("{:.2}", mirror.volume)),
        Line::raw(""),
        row("clear     c", ""),
        row("quit      q", ""),
    ];

    frame.render_widget(Paragraph::new(rows).block(block), area);
}

fn row(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {label:<12}"), Style::default().fg(Color::DarkGray)),
        Span::raw(value.to_string()),
    ])
}
