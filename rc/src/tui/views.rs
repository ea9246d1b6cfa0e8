//! TUI views and rendering
//!
//! Views draw a `ViewState` snapshot plus the App's cursors and never change
//! either.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use tracing::trace;

use super::app::{App, ConfirmDialog, IngredientsFocus};
use crate::controller::{View, ViewState};
use crate::domain::{Ingredient, Recipe};
use crate::forms::{IngredientField, IngredientForm, RecipeField, RecipeForm};

mod colors {
    use ratatui::style::Color;

    pub const HEADER: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const KEYBIND: Color = Color::Rgb(0, 255, 255); // Cyan
    pub const ACTIVE_TAB: Color = Color::Rgb(255, 215, 0); // Gold
    pub const ERROR: Color = Color::Rgb(220, 20, 60); // Crimson
    pub const BANNER_BG: Color = Color::Rgb(90, 20, 30);
    pub const FOCUS: Color = Color::Rgb(0, 255, 127); // Spring green
    pub const SELECTED_BG: Color = Color::Rgb(40, 40, 40);
    pub const DIM: Color = Color::DarkGray;
}

const EMPTY_LIST: &str = "No recipes yet. Add one via \"Add recipe\" or create ingredients first under \"Ingredients\".";
const INGREDIENTS_HELP: &str = "Add ingredients here; then use them when creating recipes. You cannot delete an ingredient that is used in a recipe.";

/// Main render function
pub fn render(app: &App, state: &ViewState, frame: &mut Frame) {
    trace!(view = ?state.view, "render: called");
    let banner_height = if state.banner.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(banner_height), // Banner
            Constraint::Min(0),                // Main content
            Constraint::Length(3),             // Footer
        ])
        .split(frame.area());

    render_header(state, frame, chunks[0]);
    if let Some(banner) = &state.banner {
        render_banner(banner, frame, chunks[1]);
    }

    match state.view {
        View::Loading => render_empty_message(frame, chunks[2], "Loading…"),
        View::List => render_list(app, state, frame, chunks[2]),
        View::Detail { .. } => render_detail(app, state, frame, chunks[2]),
        View::AddForm => render_recipe_form(
            &state.add_form,
            FormChrome {
                title: " Add recipe ",
                action: "Save recipe",
                error: state.add_error.as_deref(),
                focus: app.focus,
                submitting: state.submitting,
            },
            &state.ingredients,
            frame,
            chunks[2],
        ),
        View::Ingredients => render_ingredients(app, state, frame, chunks[2]),
    }

    render_footer(state, frame, chunks[3]);

    if let Some(dialog) = &app.dialog {
        render_confirm_dialog(dialog, frame, frame.area());
    }
}

/// App name and the three navigation tabs
fn render_header(state: &ViewState, frame: &mut Frame, area: Rect) {
    trace!("render_header: called");
    let active = match state.view {
        View::List | View::Detail { .. } => Some(View::List),
        View::AddForm => Some(View::AddForm),
        View::Ingredients => Some(View::Ingredients),
        View::Loading => None,
    };

    let mut spans = vec![
        Span::styled(
            " Recipe Manager",
            Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
    ];
    for (key, view) in [("F1", View::List), ("F2", View::AddForm), ("F3", View::Ingredients)] {
        let style = if active == Some(view) {
            Style::default().fg(colors::ACTIVE_TAB).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::DIM)
        };
        spans.push(Span::styled(format!("[{}] ", key), Style::default().fg(colors::KEYBIND)));
        spans.push(Span::styled(view.display_name(), style));
        spans.push(Span::raw("   "));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_banner(message: &str, frame: &mut Frame, area: Rect) {
    let banner = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", message), Style::default().fg(Color::White)),
        Span::styled("  [x] dismiss", Style::default().fg(colors::DIM)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors::ERROR))
            .style(Style::default().bg(colors::BANNER_BG)),
    );
    frame.render_widget(banner, area);
}

fn render_list(app: &App, state: &ViewState, frame: &mut Frame, area: Rect) {
    trace!(count = state.recipes.len(), "render_list: called");
    let block = Block::default().borders(Borders::ALL).title(" Recipes ");
    if state.recipes.is_empty() {
        frame.render_widget(block, area);
        render_empty_message(frame, area, EMPTY_LIST);
        return;
    }

    let items: Vec<ListItem> = state.recipes.iter().map(recipe_item).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(colors::SELECTED_BG).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default().with_selected(Some(app.list_cursor));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn recipe_item(recipe: &Recipe) -> ListItem<'_> {
    let mut spans = vec![
        Span::styled(recipe.name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("  {} ingredient(s)", recipe.ingredient_count()),
            Style::default().fg(colors::DIM),
        ),
    ];
    if let Some(created) = recipe.created_at {
        spans.push(Span::styled(
            format!("  {}", created.format("%Y-%m-%d")),
            Style::default().fg(colors::DIM),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn render_detail(app: &App, state: &ViewState, frame: &mut Frame, area: Rect) {
    trace!(view = ?state.view, "render_detail: called");
    let detail = &state.detail;

    if let Some(form) = &detail.edit {
        render_recipe_form(
            form,
            FormChrome {
                title: " Edit recipe ",
                action: "Update recipe",
                error: detail.edit_error.as_deref(),
                focus: app.focus,
                submitting: state.submitting,
            },
            &state.ingredients,
            frame,
            area,
        );
        return;
    }

    let Some(recipe) = &detail.recipe else {
        if let Some(error) = &detail.error {
            let content = vec![
                Line::from(""),
                Line::from(Span::styled(error.as_str(), Style::default().fg(colors::ERROR))),
                Line::from(""),
                Line::from(vec![
                    Span::styled("[Esc] ", Style::default().fg(colors::KEYBIND)),
                    Span::raw("Back to list"),
                ]),
            ];
            let widget = Paragraph::new(content)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Recipe "));
            frame.render_widget(widget, area);
        } else {
            frame.render_widget(Block::default().borders(Borders::ALL).title(" Recipe "), area);
            render_empty_message(frame, area, "Loading…");
        }
        return;
    };

    let mut lines = Vec::new();
    if let Some(created) = recipe.created_at {
        lines.push(Line::from(Span::styled(
            format!("Created {}", created.format("%Y-%m-%d %H:%M")),
            Style::default().fg(colors::DIM),
        )));
        lines.push(Line::from(""));
    }
    lines.push(section("Ingredients"));
    if recipe.ingredients.is_empty() {
        lines.push(Line::from(Span::styled("No ingredients.", Style::default().fg(colors::DIM))));
    }
    for item in &recipe.ingredients {
        lines.push(Line::from(vec![
            Span::raw("  • "),
            Span::styled(item.quantity.as_str(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::raw(item.effective_unit().unwrap_or("—")),
            Span::raw(" "),
            Span::raw(item.ingredient_name.as_str()),
        ]));
    }
    if !recipe.instructions.is_empty() {
        lines.push(Line::from(""));
        lines.push(section("Instructions"));
        lines.extend(recipe.instructions.lines().map(|l| Line::from(l.to_string())));
    }
    if let Some(error) = &detail.action_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(colors::ERROR))));
    }

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", recipe.name))
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        );
    frame.render_widget(widget, area);
}

/// Title, button label and status for a recipe form
struct FormChrome<'a> {
    title: &'a str,
    action: &'a str,
    error: Option<&'a str>,
    focus: usize,
    submitting: bool,
}

fn render_recipe_form(
    form: &RecipeForm,
    chrome: FormChrome<'_>,
    ingredients: &[Ingredient],
    frame: &mut Frame,
    area: Rect,
) {
    trace!(lines = form.lines.len(), focus = chrome.focus, "render_recipe_form: called");
    let focused = form.field_at(chrome.focus);
    let mut lines = Vec::new();

    if let Some(error) = chrome.error {
        lines.push(Line::from(Span::styled(error, Style::default().fg(colors::ERROR))));
        lines.push(Line::from(""));
    }

    lines.push(input_line(
        "Recipe name",
        &form.name,
        "e.g. Pasta al pomodoro",
        focused == RecipeField::Name,
    ));
    lines.push(Line::from(field_label("Instructions", focused == RecipeField::Instructions)));
    if form.instructions.is_empty() {
        lines.push(Line::from(placeholder("  Steps to make the recipe…")));
    }
    let mut instruction_lines: Vec<&str> = form.instructions.split('\n').collect();
    if form.instructions.is_empty() {
        instruction_lines.clear();
    }
    let last = instruction_lines.len().saturating_sub(1);
    for (i, text) in instruction_lines.iter().enumerate() {
        let mut spans = vec![Span::raw("  "), Span::raw(text.to_string())];
        if i == last && focused == RecipeField::Instructions {
            spans.push(cursor());
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(section("Ingredients"));
    if ingredients.is_empty() {
        lines.push(Line::from(placeholder("  No ingredients available; add some under Ingredients first.")));
    }
    for (idx, draft) in form.lines.iter().enumerate() {
        let selected = draft
            .selected_ingredient()
            .and_then(|id| ingredients.iter().find(|i| i.id == id))
            .map(Ingredient::label);
        let ingredient_focus = focused == RecipeField::Ingredient(idx);
        let choice = match selected {
            Some(label) => Span::raw(label),
            None => placeholder("Select…"),
        };
        let mut spans = vec![Span::styled(format!("  {}. ", idx + 1), Style::default().fg(colors::DIM))];
        spans.push(Span::styled("‹ ", focus_style(ingredient_focus)));
        spans.push(choice);
        spans.push(Span::styled(" ›", focus_style(ingredient_focus)));
        spans.push(Span::raw("   "));
        spans.extend(inline_input(
            &draft.quantity,
            "e.g. 200 or 1/2 cup",
            focused == RecipeField::Quantity(idx),
        ));
        spans.push(Span::raw("   "));
        spans.extend(inline_input(
            &draft.unit_override,
            "Unit override (optional)",
            focused == RecipeField::UnitOverride(idx),
        ));
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    let action = if chrome.submitting { "Saving…" } else { chrome.action };
    let action_style = if chrome.submitting {
        Style::default().fg(colors::DIM)
    } else {
        Style::default().fg(Color::Black).bg(colors::FOCUS).add_modifier(Modifier::BOLD)
    };
    lines.push(Line::from(vec![
        Span::styled(format!(" {} ", action), action_style),
        Span::styled("  [Ctrl+S]", Style::default().fg(colors::KEYBIND)),
    ]));

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(chrome.title));
    frame.render_widget(widget, area);
}

fn render_ingredients(app: &App, state: &ViewState, frame: &mut Frame, area: Rect) {
    trace!(count = state.ingredients.len(), "render_ingredients: called");
    let view = &state.ingredients_view;
    let form_height = if view.form_error.is_some() { 6 } else { 5 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),           // Help text
            Constraint::Length(form_height), // Add form
            Constraint::Min(0),              // List
        ])
        .split(area);

    let help = Paragraph::new(Span::styled(INGREDIENTS_HELP, Style::default().fg(colors::DIM)))
        .wrap(Wrap { trim: true });
    frame.render_widget(help, chunks[0].inner(Margin::new(1, 0)));

    // Add form
    let form_active = app.ingredients_focus == IngredientsFocus::Form && view.editing.is_none();
    let mut form_lines = Vec::new();
    if let Some(error) = &view.form_error {
        form_lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(colors::ERROR))));
    }
    form_lines.extend(ingredient_inputs(&view.form, form_active.then_some(app.ingredient_field)));
    let button = if state.submitting { "Adding…" } else { "Add" };
    form_lines.push(Line::from(vec![
        Span::styled(format!(" {} ", button), focus_style(form_active)),
        Span::styled("  [Enter]", Style::default().fg(colors::KEYBIND)),
    ]));
    let border = if form_active { colors::FOCUS } else { colors::DIM };
    let form = Paragraph::new(form_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Add ingredient "),
    );
    frame.render_widget(form, chunks[1]);

    // List with at most one row in edit mode
    let mut items: Vec<ListItem> = Vec::with_capacity(state.ingredients.len());
    for ingredient in &state.ingredients {
        match &view.editing {
            Some(edit) if edit.id == ingredient.id => {
                let mut lines = ingredient_inputs(&edit.form, Some(app.ingredient_field));
                if let Some(error) = &edit.error {
                    lines.push(Line::from(Span::styled(error.as_str(), Style::default().fg(colors::ERROR))));
                }
                let save = if state.submitting { "Saving…" } else { "Save" };
                lines.push(Line::from(vec![
                    Span::styled(format!(" {} ", save), focus_style(true)),
                    Span::styled("  [Enter] save  [Esc] cancel", Style::default().fg(colors::DIM)),
                ]));
                items.push(ListItem::new(lines));
            }
            _ => items.push(ListItem::new(Line::from(vec![
                Span::styled(ingredient.name.as_str(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(ingredient.unit.as_deref().unwrap_or("—"), Style::default().fg(colors::DIM)),
            ]))),
        }
    }

    let mut title = format!(" Ingredients ({}) ", state.ingredients.len());
    if let Some(error) = &view.error {
        title = format!(" Ingredients ({}) - {} ", state.ingredients.len(), error);
    }
    let title_style = if view.error.is_some() {
        Style::default().fg(colors::ERROR)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, title_style));

    if items.is_empty() {
        frame.render_widget(block, chunks[2]);
        render_empty_message(frame, chunks[2], "No ingredients yet.");
        return;
    }

    let list_active = app.ingredients_focus == IngredientsFocus::List || view.editing.is_some();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(colors::SELECTED_BG))
        .highlight_symbol(if list_active { "▶ " } else { "  " });
    let mut list_state = ListState::default().with_selected(Some(app.ingredient_cursor));
    frame.render_stateful_widget(list, chunks[2], &mut list_state);
}

fn ingredient_inputs(form: &IngredientForm, focused: Option<IngredientField>) -> Vec<Line<'static>> {
    vec![
        input_line("Name", &form.name, "e.g. Flour", focused == Some(IngredientField::Name)),
        input_line("Unit", &form.unit, "e.g. g, ml, pcs", focused == Some(IngredientField::Unit)),
    ]
}

fn render_footer(state: &ViewState, frame: &mut Frame, area: Rect) {
    trace!("render_footer: called");
    let keybinds: Vec<(&str, &str)> = match state.view {
        View::Loading => vec![("[q]", "Quit")],
        View::List => vec![
            ("[j/k]", "Move"),
            ("[Enter]", "Open"),
            ("[a]", "Add"),
            ("[i]", "Ingredients"),
            ("[r]", "Reload"),
            ("[q]", "Quit"),
        ],
        View::Detail { .. } if state.detail.edit.is_some() => form_keybinds("Cancel edit"),
        View::Detail { .. } => vec![
            ("[Esc]", "Back"),
            ("[e]", "Edit"),
            ("[d]", "Delete"),
            ("[r]", "Refresh"),
        ],
        View::AddForm => form_keybinds("Cancel"),
        View::Ingredients if state.ingredients_view.editing.is_some() => vec![
            ("[Tab]", "Field"),
            ("[Enter]", "Save"),
            ("[Esc]", "Cancel"),
        ],
        View::Ingredients => vec![
            ("[Tab]", "Add form"),
            ("[e]", "Edit"),
            ("[d]", "Delete"),
            ("[Esc]", "Back"),
        ],
    };

    let mut spans = Vec::new();
    if state.submitting {
        spans.push(Span::styled(" Saving… ", Style::default().fg(colors::ACTIVE_TAB)));
    }
    for (key, desc) in keybinds {
        spans.push(Span::styled(format!(" {}", key), Style::default().fg(colors::KEYBIND)));
        spans.push(Span::raw(format!(" {} ", desc)));
    }

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn form_keybinds(cancel: &'static str) -> Vec<(&'static str, &'static str)> {
    vec![
        ("[Tab]", "Next"),
        ("[←/→]", "Pick ingredient"),
        ("[Ctrl+A]", "Add line"),
        ("[Ctrl+D]", "Remove line"),
        ("[Ctrl+S]", "Save"),
        ("[Esc]", cancel),
    ]
}

/// Render confirmation dialog
fn render_confirm_dialog(dialog: &ConfirmDialog, frame: &mut Frame, area: Rect) {
    trace!("render_confirm_dialog: called");
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);

    let yes_style = if dialog.selected_button {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    let no_style = if !dialog.selected_button {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Red)
    };

    let content = vec![
        Line::from(""),
        Line::from(dialog.message.as_str()),
        Line::from(""),
        Line::from(vec![
            Span::styled(" No ", no_style),
            Span::raw("    "),
            Span::styled(" Yes ", yes_style),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Tab/←→: switch  Enter: confirm  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let widget = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Confirm ")
                .style(Style::default().bg(Color::Black)),
        )
        .alignment(Alignment::Center);
    frame.render_widget(widget, popup_area);
}

fn render_empty_message(frame: &mut Frame, area: Rect, message: &str) {
    trace!(%message, "render_empty_message: called");
    let inner = area.inner(Margin {
        horizontal: 2,
        vertical: 2,
    });
    let empty = Paragraph::new(message)
        .style(Style::default().fg(colors::DIM))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(empty, inner);
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(colors::HEADER).add_modifier(Modifier::BOLD),
    ))
}

fn field_label(label: &str, focused: bool) -> Span<'static> {
    let marker = if focused { "▶ " } else { "  " };
    Span::styled(format!("{}{}", marker, label), focus_style(focused))
}

fn input_line(label: &str, value: &str, hint: &str, focused: bool) -> Line<'static> {
    let mut spans = vec![field_label(label, focused), Span::raw(": ")];
    spans.extend(inline_input(value, hint, focused));
    Line::from(spans)
}

fn inline_input(value: &str, hint: &str, focused: bool) -> Vec<Span<'static>> {
    let mut spans = if value.is_empty() {
        vec![placeholder(hint)]
    } else {
        vec![Span::styled(value.to_string(), Style::default().add_modifier(Modifier::UNDERLINED))]
    };
    if focused {
        spans.push(cursor());
    }
    spans
}

fn placeholder(text: &str) -> Span<'static> {
    Span::styled(
        text.to_string(),
        Style::default().fg(colors::DIM).add_modifier(Modifier::ITALIC),
    )
}

fn cursor() -> Span<'static> {
    Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK))
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(colors::FOCUS).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

/// Helper to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    trace!(percent_x, percent_y, "centered_rect: called");
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
