// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use larder_app::{Card, DetailView, Feature, RecipeId, UiEvent, ViewKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use std::io;
use std::time::Duration;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const SAVED_MARK: &str = "♥";
const UNSAVED_MARK: &str = "♡";

/// What the terminal front end needs from a recipe session.
///
/// Every call returns the events to apply right away; results of background
/// lookups arrive later through [`AppRuntime::poll_events`].
pub trait AppRuntime {
    fn start(&mut self) -> Vec<UiEvent>;
    fn search(&mut self, query: &str) -> Vec<UiEvent>;
    fn filter_category(&mut self, category: &str) -> Vec<UiEvent>;
    fn show_favorites(&mut self) -> Vec<UiEvent>;
    fn toggle_favorite(&mut self, id: &RecipeId) -> Result<Vec<UiEvent>>;
    fn open_details(&mut self, id: &RecipeId) -> Vec<UiEvent>;
    fn random_recipe(&mut self) -> Vec<UiEvent>;
    fn suggestion_input(&mut self, text: &str) -> Vec<UiEvent>;
    fn select_suggestion(&mut self, name: &str) -> Vec<UiEvent>;
    fn categories(&self) -> &[String];
    fn poll_events(&mut self) -> Vec<UiEvent>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiModel {
    pub input: String,
    pub suggestions: Vec<String>,
    pub suggestion_cursor: Option<usize>,
    pub view: Option<ViewKind>,
    pub cards: Vec<Card>,
    pub message: Option<String>,
    pub selected: usize,
    pub detail: Option<DetailView>,
    pub feature: Option<Feature>,
    pub category_cursor: Option<usize>,
    pub loading: bool,
    pub status: Option<String>,
}

impl UiModel {
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Render(payload) => {
                let same_view = self.view == Some(payload.view());
                let same_cards = self
                    .cards
                    .iter()
                    .map(|card| &card.id)
                    .eq(payload.cards().iter().map(|card| &card.id));
                self.view = Some(payload.view());
                self.cards = payload.cards().to_vec();
                self.message = payload.message().map(ToOwned::to_owned);
                if !same_view || !same_cards {
                    self.selected = 0;
                }
            }
            UiEvent::Suggestions(payload) => {
                self.suggestions = payload.names;
                self.suggestion_cursor = None;
            }
            UiEvent::ClearSuggestions => self.clear_suggestions(),
            UiEvent::Detail(detail) => self.detail = Some(*detail),
            UiEvent::DetailUnavailable(message) => {
                self.detail = None;
                self.status = Some(message);
            }
            UiEvent::RecipeOfDay(feature) => self.feature = Some(feature),
            UiEvent::Loading(loading) => self.loading = loading,
            UiEvent::Status(message) => self.status = Some(message),
        }
    }

    pub fn apply_all(&mut self, events: impl IntoIterator<Item = UiEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    pub fn selected_card(&self) -> Option<&Card> {
        self.cards.get(self.selected)
    }

    /// The card actions target: the selected card, or the recipe of the day
    /// when the list is empty.
    fn target(&self) -> Option<&Card> {
        self.selected_card()
            .or_else(|| self.feature.as_ref().map(|feature| &feature.card))
    }

    fn highlighted_suggestion(&self) -> Option<&str> {
        self.suggestion_cursor
            .and_then(|index| self.suggestions.get(index))
            .map(String::as_str)
    }

    fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.suggestion_cursor = None;
    }
}

pub fn run_app<R: AppRuntime>(model: &mut UiModel, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    model.apply_all(runtime.start());

    let mut result = Ok(());
    loop {
        model.apply_all(runtime.poll_events());

        if let Err(error) = terminal.draw(|frame| render(frame, model)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(EVENT_POLL_INTERVAL).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(model, runtime, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Applies one key press. Returns `true` when the user asked to quit.
pub fn handle_key_event<R: AppRuntime>(model: &mut UiModel, runtime: &mut R, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('q') {
        return true;
    }

    if let Some(open) = model.detail.as_ref().map(|detail| detail.id.clone()) {
        match key.code {
            KeyCode::Esc | KeyCode::Left => model.detail = None,
            KeyCode::Char('s') if ctrl => toggle_favorite(model, runtime, &open),
            _ => {}
        }
        return false;
    }

    if ctrl {
        match key.code {
            KeyCode::Char('s') => {
                if let Some(id) = model.target().map(|card| card.id.clone()) {
                    toggle_favorite(model, runtime, &id);
                }
            }
            KeyCode::Char('o') => open_target(model, runtime),
            KeyCode::Char('f') => model.apply_all(runtime.show_favorites()),
            KeyCode::Char('g') => cycle_category(model, runtime),
            KeyCode::Char('r') => model.apply_all(runtime.random_recipe()),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Esc => model.clear_suggestions(),
        KeyCode::Enter => submit(model, runtime),
        KeyCode::Tab => cycle_suggestion(model, 1),
        KeyCode::BackTab => cycle_suggestion(model, -1),
        KeyCode::Up => model.selected = model.selected.saturating_sub(1),
        KeyCode::Down => {
            if model.selected + 1 < model.cards.len() {
                model.selected += 1;
            }
        }
        KeyCode::Right => open_target(model, runtime),
        KeyCode::Backspace => {
            model.input.pop();
            edit_input(model, runtime);
        }
        KeyCode::Char(ch) => {
            model.input.push(ch);
            edit_input(model, runtime);
        }
        _ => {}
    }
    false
}

fn edit_input<R: AppRuntime>(model: &mut UiModel, runtime: &mut R) {
    model.suggestion_cursor = None;
    model.apply_all(runtime.suggestion_input(&model.input));
}

fn submit<R: AppRuntime>(model: &mut UiModel, runtime: &mut R) {
    if let Some(name) = model.highlighted_suggestion().map(ToOwned::to_owned) {
        model.input = name.clone();
        model.clear_suggestions();
        model.apply_all(runtime.select_suggestion(&name));
        return;
    }
    let query = model.input.trim().to_owned();
    if query.is_empty() {
        return;
    }
    model.clear_suggestions();
    model.apply_all(runtime.search(&query));
}

fn cycle_suggestion(model: &mut UiModel, step: isize) {
    let count = model.suggestions.len();
    if count == 0 {
        return;
    }
    let next = match model.suggestion_cursor {
        None if step >= 0 => 0,
        None => count - 1,
        Some(current) => (current as isize + step).rem_euclid(count as isize) as usize,
    };
    model.suggestion_cursor = Some(next);
}

fn cycle_category<R: AppRuntime>(model: &mut UiModel, runtime: &mut R) {
    let categories = runtime.categories();
    if categories.is_empty() {
        model.status = Some("no categories available".to_owned());
        return;
    }
    let next = model
        .category_cursor
        .map_or(0, |current| (current + 1) % categories.len());
    let category = categories[next].clone();
    model.category_cursor = Some(next);
    model.apply_all(runtime.filter_category(&category));
}

fn open_target<R: AppRuntime>(model: &mut UiModel, runtime: &mut R) {
    if let Some(id) = model.target().map(|card| card.id.clone()) {
        model.apply_all(runtime.open_details(&id));
    }
}

fn toggle_favorite<R: AppRuntime>(model: &mut UiModel, runtime: &mut R, id: &RecipeId) {
    match runtime.toggle_favorite(id) {
        Ok(events) => model.apply_all(events),
        Err(error) => model.status = Some(format!("save failed: {error:#}")),
    }
}

pub fn render(frame: &mut ratatui::Frame<'_>, model: &UiModel) {
    let feature_height = if model.feature.is_some() { 5 } else { 0 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(feature_height),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let input = Paragraph::new(model.input.as_str())
        .block(Block::default().title("larder").borders(Borders::ALL));
    frame.render_widget(input, layout[0]);

    if let Some(feature) = &model.feature {
        let widget = Paragraph::new(feature_text(feature))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title("recipe of the day")
                    .borders(Borders::ALL),
            );
        frame.render_widget(widget, layout[1]);
    }

    render_results(frame, layout[2], model);

    let status = Paragraph::new(status_text(model))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if !model.suggestions.is_empty() {
        render_suggestions(frame, layout[0], model);
    }

    if let Some(detail) = &model.detail {
        let area = centered_rect(80, 80, frame.area());
        frame.render_widget(Clear, area);
        let widget = Paragraph::new(detail_text(detail))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(detail.title.as_str())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::White)),
            );
        frame.render_widget(widget, area);
    } else {
        let typed = u16::try_from(model.input.chars().count()).unwrap_or(u16::MAX);
        let cursor_x = layout[0].x.saturating_add(1).saturating_add(typed);
        frame.set_cursor_position((cursor_x.min(layout[0].right().saturating_sub(2)), layout[0].y + 1));
    }
}

fn render_results(frame: &mut ratatui::Frame<'_>, area: Rect, model: &UiModel) {
    let title = results_title(model);
    let block = Block::default().title(title).borders(Borders::ALL);

    if let Some(message) = &model.message {
        let widget = Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(widget, area);
        return;
    }

    let items: Vec<ListItem<'_>> = model
        .cards
        .iter()
        .map(|card| ListItem::new(card_line(card)))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !model.cards.is_empty() {
        state.select(Some(model.selected.min(model.cards.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_suggestions(frame: &mut ratatui::Frame<'_>, anchor: Rect, model: &UiModel) {
    let full = frame.area();
    let height = (model.suggestions.len() as u16 + 2).min(full.height.saturating_sub(anchor.bottom()));
    if height < 3 {
        return;
    }
    let area = Rect {
        x: anchor.x + 1,
        y: anchor.bottom(),
        width: anchor.width.saturating_sub(2).min(48),
        height,
    };
    let items: Vec<ListItem<'_>> = model
        .suggestions
        .iter()
        .map(|name| ListItem::new(name.as_str()))
        .collect();
    let list = List::new(items)
        .block(Block::default().title("suggestions").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(model.suggestion_cursor);
    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

fn results_title(model: &UiModel) -> String {
    match model.view {
        Some(view) if !model.cards.is_empty() => format!("{} ({})", view.label(), model.cards.len()),
        Some(view) => view.label().to_owned(),
        None => "results".to_owned(),
    }
}

fn card_line(card: &Card) -> Line<'_> {
    let mark = if card.is_favorite {
        Span::styled(SAVED_MARK, Style::default().fg(Color::Red))
    } else {
        Span::raw(UNSAVED_MARK)
    };
    Line::from(vec![mark, Span::raw(" "), Span::raw(card.name.as_str())])
}

fn feature_text(feature: &Feature) -> Vec<Line<'_>> {
    let saved = if feature.card.is_favorite {
        "Saved"
    } else {
        "Save"
    };
    vec![
        Line::from(vec![
            Span::styled(
                feature.card.name.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  [{saved}]")),
        ]),
        Line::from(feature.teaser.as_str()),
    ]
}

fn detail_text(detail: &DetailView) -> Vec<Line<'_>> {
    let mut lines = vec![
        Line::from(Span::styled(
            detail.subtitle.as_str(),
            Style::default().fg(Color::Gray),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Ingredients",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    lines.extend(
        detail
            .ingredients
            .iter()
            .map(|ingredient| Line::from(format!("  • {ingredient}"))),
    );
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Instructions",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.extend(detail.instructions.lines().map(Line::from));
    if let Some(video) = &detail.video_url {
        lines.push(Line::default());
        lines.push(Line::from(format!("Video: {video}")));
    }
    lines
}

fn status_text(model: &UiModel) -> String {
    let hints = if model.detail.is_some() {
        "esc close | ctrl+s save | ctrl+q quit"
    } else {
        "enter search | tab suggest | up/down select | ctrl+s save | ctrl+o details | ctrl+f favorites | ctrl+g category | ctrl+r random | ctrl+q quit"
    };
    let mut prefix = String::new();
    if model.loading {
        prefix.push_str("loading… | ");
    }
    if let Some(status) = &model.status {
        prefix.push_str(status);
        prefix.push_str(" | ");
    }
    format!("{prefix}{hints}")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
