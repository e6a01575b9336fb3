//! Live terminal dashboard. Rendering is driven by one cooperative loop:
//! poll the session when the tick elapses, redraw, and watch for input in
//! whatever is left of the tick budget.

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
};

use crate::core::{FullSnapshot, SystemInfo};
use crate::reader::SnapshotReader;
use crate::session::MonitorSession;
use crate::view;

const INPUT_POLL_SLICE: Duration = Duration::from_millis(100);

/// Run the dashboard until the user quits. The session is polled once up
/// front so the first frame has data.
pub fn run_dashboard<R: SnapshotReader>(
    mut session: MonitorSession<R>,
    interval: Duration,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut session, interval);

    // Always restore the terminal, even when the loop errored
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    session.close();
    result
}

fn event_loop<R: SnapshotReader>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut MonitorSession<R>,
    interval: Duration,
) -> io::Result<()> {
    session.refresh();
    let mut last_poll = Instant::now();

    loop {
        terminal.draw(|frame| draw(frame, session))?;

        let budget = interval
            .checked_sub(last_poll.elapsed())
            .unwrap_or(Duration::ZERO)
            .min(INPUT_POLL_SLICE);

        if event::poll(budget)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    return Ok(());
                }
            }
        }

        if last_poll.elapsed() >= interval {
            session.refresh();
            last_poll = Instant::now();
        }
    }
}

fn draw<R: SnapshotReader>(frame: &mut Frame, session: &MonitorSession<R>) {
    let snapshot = session.snapshot();
    let core_rows = snapshot.map_or(0, |s| s.cores.len()) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),              // system info | derived stats
            Constraint::Length(core_rows + 3),  // core table
            Constraint::Length(7),              // constraints | memory
            Constraint::Length(6),              // power | graphics
            Constraint::Length(1),              // status line
        ])
        .split(frame.size());

    let top = split_in_two(chunks[0]);
    draw_system_info(frame, top[0], session.system());
    draw_derived_stats(frame, top[1], snapshot);

    draw_core_table(frame, chunks[1], snapshot);

    let middle = split_in_two(chunks[2]);
    draw_constraints(frame, middle[0], snapshot);
    draw_memory(frame, middle[1], snapshot);

    let bottom = split_in_two(chunks[3]);
    draw_power(frame, bottom[0], snapshot);
    draw_graphics(frame, bottom[1], snapshot);

    draw_status_line(frame, chunks[4], session);
}

fn split_in_two(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn draw_system_info(frame: &mut Frame, area: Rect, system: &SystemInfo) {
    let lines = vec![
        Line::from(format!("CPU: {}", system.cpu_name)),
        Line::from(format!("Codename: {}", system.codename)),
        Line::from(format!(
            "Cores: {} / CCDs: {} / CCXs: {}",
            system.enabled_cores, system.ccds, system.ccxs
        )),
        Line::from(format!(
            "SMU: v{} (interface v{})",
            system.smu_fw_version, system.smu_if_version
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(panel("System Information")),
        area,
    );
}

fn draw_derived_stats(frame: &mut Frame, area: Rect, snapshot: Option<&FullSnapshot>) {
    let lines = match snapshot {
        Some(s) => vec![
            Line::from(format!(
                "Peak Freq: {}   Peak Temp: {}",
                view::fmt_unit(s.stats.peak_core_frequency_mhz, 0, "MHz"),
                view::fmt_unit(s.stats.peak_core_temp, 1, "°C"),
            )),
            Line::from(format!(
                "Peak Voltage: {}   Avg Voltage: {}",
                view::fmt_unit(s.stats.peak_core_voltage, 3, "V"),
                view::fmt_unit(s.stats.avg_core_voltage, 3, "V"),
            )),
            Line::from(format!(
                "Avg CC6: {}   Package CC6: {}",
                view::fmt_unit(s.stats.avg_core_cc6, 1, "%"),
                view::package_cc6_cell(&s.stats),
            )),
            Line::from(format!(
                "Total Core Power: {}   Peak Voltage (SMU): {}",
                view::fmt_unit(s.stats.total_core_power, 3, "W"),
                view::fmt_unit(s.stats.peak_core_voltage_smu, 3, "V"),
            )),
        ],
        None => vec![Line::from("Waiting for first snapshot...")],
    };
    frame.render_widget(
        Paragraph::new(lines).block(panel("Core Statistics (Derived)")),
        area,
    );
}

fn draw_core_table(frame: &mut Frame, area: Rect, snapshot: Option<&FullSnapshot>) {
    let header = Row::new(
        ["Core", "Freq (MHz)", "Power (W)", "Voltage (V)", "Temp (°C)", "C0 %", "C1 %", "C6 %"]
            .map(Cell::from),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = snapshot
        .map(|s| {
            s.cores
                .iter()
                .map(|core| {
                    let style = if core.disabled {
                        Style::default().fg(Color::DarkGray)
                    } else if core.sleeping {
                        Style::default().fg(Color::Blue)
                    } else {
                        Style::default()
                    };
                    Row::new(view::core_row(core).map(Cell::from)).style(style)
                })
                .collect()
        })
        .unwrap_or_default();

    let widths = [
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(7),
    ];

    frame.render_widget(
        Table::new(rows, widths)
            .header(header)
            .block(panel("Core Statistics (Live)")),
        area,
    );
}

fn draw_constraints(frame: &mut Frame, area: Rect, snapshot: Option<&FullSnapshot>) {
    let block = panel("Constraints");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(s) = snapshot else { return };
    let c = &s.constraints;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(format!(
            "Peak Temp: {}",
            view::fmt_unit(c.peak_temp, 1, "°C")
        )),
        rows[0],
    );

    let gauges = [
        ("PPT", c.ppt_value, c.ppt_limit, "W", Color::Green),
        ("TDC", c.tdc_value, c.tdc_limit, "A", Color::Cyan),
        ("EDC", c.edc_value, c.edc_limit, "A", Color::Yellow),
        ("THM", c.thm_value, c.thm_limit, "°C", Color::Red),
    ];

    for (i, (name, value, limit, unit, color)) in gauges.into_iter().enumerate() {
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color).bg(Color::Black))
            .percent(view::gauge_percent(value, limit))
            .label(format!("{name}: {}", view::limit_label(value, limit, unit)));
        frame.render_widget(gauge, rows[i + 1]);
    }
}

fn draw_memory(frame: &mut Frame, area: Rect, snapshot: Option<&FullSnapshot>) {
    let lines = match snapshot {
        Some(s) => {
            let m = &s.memory;
            vec![
                Line::from(format!(
                    "FCLK: {}   FCLK (Eff): {}",
                    view::fmt_unit(m.fclk_mhz, 0, "MHz"),
                    view::fmt_unit(m.fclk_eff_mhz, 0, "MHz"),
                )),
                Line::from(format!(
                    "UCLK: {}   MEMCLK: {}",
                    view::fmt_unit(m.uclk_mhz, 0, "MHz"),
                    view::fmt_unit(m.memclk_mhz, 0, "MHz"),
                )),
                Line::from(format!("Coupled: {}", view::coupled_cell(m.coupled_mode))),
                Line::from(format!(
                    "VDDM: {}   VDDP: {}",
                    view::fmt_unit(m.v_vddm, 4, "V"),
                    view::fmt_unit(m.v_vddp, 4, "V"),
                )),
            ]
        }
        None => vec![],
    };
    frame.render_widget(
        Paragraph::new(lines).block(panel("Memory Interface")),
        area,
    );
}

fn draw_power(frame: &mut Frame, area: Rect, snapshot: Option<&FullSnapshot>) {
    let lines = match snapshot {
        Some(s) => {
            let p = &s.power;
            vec![
                Line::from(format!("Socket: {}", view::fmt_unit(p.socket_power, 3, "W"))),
                Line::from(format!(
                    "Core Total: {}",
                    view::fmt_unit(p.total_core_power, 3, "W")
                )),
                Line::from(format!(
                    "SoC: {}",
                    view::fmt_unit(p.vddcr_soc_power, 3, "W")
                )),
                Line::from(format!(
                    "Package: {}",
                    view::fmt_unit(p.package_power, 3, "W")
                )),
            ]
        }
        None => vec![],
    };
    frame.render_widget(
        Paragraph::new(lines).block(panel("Power Consumption")),
        area,
    );
}

fn draw_graphics(frame: &mut Frame, area: Rect, snapshot: Option<&FullSnapshot>) {
    let lines = match snapshot {
        Some(s) if s.graphics.is_populated() => {
            let g = &s.graphics;
            vec![
                Line::from(format!(
                    "GFX Clock: {}   (Eff: {})",
                    view::fmt_unit(g.gfx_freq_mhz, 0, "MHz"),
                    view::fmt_unit(g.gfx_freq_eff_mhz, 0, "MHz"),
                )),
                Line::from(format!(
                    "GFX Temp: {}   Busy: {}",
                    view::fmt_unit(g.gfx_temp, 1, "°C"),
                    view::fmt_unit(g.gfx_busy_percent, 1, "%"),
                )),
                Line::from(format!(
                    "Displays: {}   FPS: {}",
                    view::fmt_value(g.display_count, 0),
                    view::fmt_value(g.fps, 0),
                )),
            ]
        }
        Some(_) => vec![Line::from("No integrated graphics telemetry")],
        None => vec![],
    };
    frame.render_widget(Paragraph::new(lines).block(panel("Graphics")), area);
}

fn draw_status_line<R: SnapshotReader>(
    frame: &mut Frame,
    area: Rect,
    session: &MonitorSession<R>,
) {
    let status = if session.consecutive_failures() > 0 {
        format!(
            " q: quit | {} consecutive read failures, showing last known values",
            session.consecutive_failures()
        )
    } else {
        " q: quit".to_string()
    };
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}
