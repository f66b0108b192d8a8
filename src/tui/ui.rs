//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::Flag;
use crate::ternary::{text, Trit, Tryte};
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());
    
    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(3),
        ])
        .split(chunks[0]);
    
    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);
    
    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(6),
        ])
        .split(chunks[1]);
    
    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// Draw disassembly view with colored trits.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));
    
    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:>6}: {}", prefix, addr, instr);
            
            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            
            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();
    
    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));
    
    frame.render_widget(list, area);
}

/// Draw register state with trit coloring.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.cpu.regs;
    let tryte = |name: &str, value: Tryte| {
        Line::from(vec![
            Span::raw(format!("{}: ", name)),
            Span::styled(format!("{}", value), Style::default().fg(Color::White)),
            Span::raw(format!(" = {:>4}", value.to_i32())),
        ])
    };

    let mut flags = vec![Span::raw("Flags: ")];
    for flag in Flag::ALL.iter().rev() {
        let value = regs.flags.get(*flag);
        flags.push(Span::styled(format!("{}{} ", flag.letter(), value), trit_style(value)));
    }

    let content = vec![
        tryte("A", regs.accum),
        tryte("X", regs.index),
        tryte("Y", regs.yindex),
        Line::from(vec![
            Span::raw("PC: "),
            Span::styled(format!("{}", regs.pc), Style::default().fg(Color::Yellow)),
            Span::raw("   SP: "),
            Span::styled(format!("{}", regs.stackptr), Style::default().fg(Color::White)),
        ]),
        Line::from(flags),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", app.cpu.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", app.cpu.state()),
                if app.cpu.is_halted() {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Green)
                }),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as i32).saturating_sub(2);
    let start = app.mem_scroll;
    let end = (start + visible_rows).min(app.cpu.mem.max_address() + 1);

    let items: Vec<ListItem> = (start..end)
        .filter_map(|addr| app.cpu.mem.peek(addr).ok().map(|value| (addr, value)))
        .map(|(addr, value)| {
            let is_pc = addr == app.cpu.regs.pc;
            let is_sp = addr == app.cpu.regs.stackptr;
            let marker = if is_sp { "SP" } else { "  " };
            let glyph = match text::decode(value) {
                Some(c) if !c.is_control() => c,
                _ => '·',
            };
            let line = format!("{} {:>6}: {} = {:>4} {}", marker, addr, value, value.to_i32(), glyph);

            let style = if is_pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if !value.is_zero() {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let title = if app.cpu.is_halted() {
        format!(" Status (halt code {}) ", app.cpu.regs.flags.get(Flag::H).to_i32())
    } else {
        " Status ".to_string()
    };
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL));
    
    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓ PgUp/PgDn: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));
    
    frame.render_widget(help, area);
}

/// Get color style for a trit.
fn trit_style(t: Trit) -> Style {
    match t {
        Trit::N => Style::default().fg(Color::Red),
        Trit::O => Style::default().fg(Color::Gray),
        Trit::P => Style::default().fg(Color::Green),
    }
}
