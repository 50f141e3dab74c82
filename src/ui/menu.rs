//! Hierarchical settings menu.
//!
//! Menu lists are `'static` tables (see [`crate::ui::menu_tree`]).  The
//! navigator never copies items: it holds the current list plus a stack of
//! parent frames, and a cursor (`selected`, `scroll`) over the visible
//! window.  Side effects go through a [`MenuHost`].

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle, Triangle};
use heapless::{String, Vec};

use crate::clock::{elapsed, Millis};
use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::drive::Direction;
use crate::settings::Flag;
use crate::ui::text;
use crate::ui::ButtonEvent;

const TITLE_HEIGHT: i32 = 12;
const ITEM_HEIGHT: i32 = 13;
const LEFT_MARGIN: i32 = 2;
const RIGHT_MARGIN: i32 = 2;
const LABEL_MAX_CHARS: usize = 15;
const TITLE_MAX_CHARS: usize = 20;
/// Info values are refreshed this often while the menu is open (ms).
const REFRESH_MS: Millis = 1_000;

/// Items that fit below the title bar.
pub const VISIBLE_ITEMS: usize = ((SCREEN_HEIGHT - TITLE_HEIGHT - 2) / ITEM_HEIGHT) as usize;

/// Deepest submenu nesting supported.
pub const MAX_DEPTH: usize = 4;

/// Side effect of an Action item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuAction {
    /// Pulse the motors in one direction.
    Drive(Direction),
    PlayChime,
    /// Leave the menu.
    Exit,
}

/// Value shown by an Info item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InfoField {
    Uptime,
    Networks,
    Link,
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    Action(MenuAction),
    Toggle(Flag),
    Submenu(&'static [MenuItem]),
    Info(InfoField),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub kind: ItemKind,
}

impl MenuItem {
    pub const fn action(label: &'static str, action: MenuAction) -> Self {
        Self {
            label,
            kind: ItemKind::Action(action),
        }
    }

    pub const fn toggle(label: &'static str, flag: Flag) -> Self {
        Self {
            label,
            kind: ItemKind::Toggle(flag),
        }
    }

    pub const fn submenu(label: &'static str, items: &'static [MenuItem]) -> Self {
        Self {
            label,
            kind: ItemKind::Submenu(items),
        }
    }

    pub const fn info(label: &'static str, field: InfoField) -> Self {
        Self {
            label,
            kind: ItemKind::Info(field),
        }
    }
}

/// Text of an Info value.
pub type InfoText = String<16>;

/// Read-only state the menu displays.
pub trait MenuView {
    fn flag(&self, flag: Flag) -> bool;
    fn info(&self, field: InfoField) -> InfoText;
}

/// Whatever the menu acts on.
pub trait MenuHost: MenuView {
    fn set_flag(&mut self, flag: Flag, value: bool);
    /// Called after a toggle was flipped, with the new value.
    fn toggled(&mut self, flag: Flag, value: bool);
    fn run(&mut self, action: MenuAction);
}

/// Result of a navigation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuSignal {
    Stay,
    /// The menu asked to be closed.
    Exit,
}

#[derive(Clone, Copy)]
struct Frame {
    items: &'static [MenuItem],
    title: &'static str,
}

pub struct MenuNavigator {
    root: Frame,
    current: Frame,
    stack: Vec<Frame, MAX_DEPTH>,
    selected: usize,
    scroll: usize,
    dirty: bool,
    last_render: Millis,
}

impl MenuNavigator {
    pub const fn new(title: &'static str, items: &'static [MenuItem]) -> Self {
        let root = Frame { items, title };
        Self {
            root,
            current: root,
            stack: Vec::new(),
            selected: 0,
            scroll: 0,
            dirty: true,
            last_render: 0,
        }
    }

    /// Reset to the root list with the cursor on the first item.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = self.root;
        self.selected = 0;
        self.scroll = 0;
        self.dirty = true;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn title(&self) -> &'static str {
        self.current.title
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn items(&self) -> &'static [MenuItem] {
        self.current.items
    }

    /// Map a button gesture to a navigation step.
    pub fn handle_button<H: MenuHost + ?Sized>(&mut self, host: &mut H, event: ButtonEvent) -> MenuSignal {
        match event {
            ButtonEvent::Click(1) => self.down(),
            ButtonEvent::Click(2) => return self.select(host),
            ButtonEvent::Click(3) => self.up(),
            ButtonEvent::LongPressStart => return self.back(),
            _ => {}
        }
        MenuSignal::Stay
    }

    pub fn down(&mut self) {
        let len = self.current.items.len();
        if len == 0 {
            return;
        }
        self.selected += 1;
        if self.selected >= len {
            self.selected = 0;
            self.scroll = 0;
        } else if self.selected >= self.scroll + VISIBLE_ITEMS {
            self.scroll += 1;
        }
        self.dirty = true;
        debug!("Menu: down -> {}", self.selected);
    }

    pub fn up(&mut self) {
        let len = self.current.items.len();
        if len == 0 {
            return;
        }
        if self.selected == 0 {
            self.selected = len - 1;
            self.scroll = len.saturating_sub(VISIBLE_ITEMS);
        } else {
            self.selected -= 1;
            if self.selected < self.scroll {
                self.scroll -= 1;
            }
        }
        self.dirty = true;
        debug!("Menu: up -> {}", self.selected);
    }

    pub fn select<H: MenuHost + ?Sized>(&mut self, host: &mut H) -> MenuSignal {
        let Some(item) = self.current.items.get(self.selected).copied() else {
            return MenuSignal::Stay;
        };
        debug!("Menu: select {=str}", item.label);

        match item.kind {
            ItemKind::Action(MenuAction::Exit) => return MenuSignal::Exit,
            ItemKind::Action(action) => host.run(action),
            ItemKind::Toggle(flag) => {
                let value = !host.flag(flag);
                host.set_flag(flag, value);
                host.toggled(flag, value);
                self.dirty = true;
            }
            ItemKind::Submenu(items) => self.descend(item.label, items),
            ItemKind::Info(_) => {}
        }
        MenuSignal::Stay
    }

    /// Return to the parent list, or ask to exit at the root.
    pub fn back(&mut self) -> MenuSignal {
        match self.stack.pop() {
            Some(parent) => {
                self.current = parent;
                self.selected = 0;
                self.scroll = 0;
                self.dirty = true;
                debug!("Menu: back to {=str}", parent.title);
                MenuSignal::Stay
            }
            None => MenuSignal::Exit,
        }
    }

    fn descend(&mut self, label: &'static str, items: &'static [MenuItem]) {
        if items.is_empty() {
            return;
        }
        if self.stack.push(self.current).is_err() {
            warn!("Menu: nesting too deep");
            return;
        }
        self.current = Frame {
            items,
            title: label,
        };
        self.selected = 0;
        self.scroll = 0;
        self.dirty = true;
        debug!("Menu: enter {=str}", label);
    }

    /// Draw the menu if it changed (or info values are due a refresh).
    ///
    /// Returns `true` when a frame was drawn and needs presenting.
    pub fn render<D, V>(&mut self, target: &mut D, view: &V, now: Millis) -> bool
    where
        D: DrawTarget<Color = BinaryColor>,
        V: MenuView + ?Sized,
    {
        if !self.dirty && elapsed(now, self.last_render) < REFRESH_MS {
            return false;
        }
        self.dirty = false;
        self.last_render = now;

        let _ = target.clear(BinaryColor::Off);
        let on = PrimitiveStyle::with_fill(BinaryColor::On);

        // Title bar.
        let _ = Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH as u32, TITLE_HEIGHT as u32))
            .into_styled(on)
            .draw(target);
        let title: String<24> = text::ellipsize(self.current.title, TITLE_MAX_CHARS);
        text::draw(target, &title, Point::new(2, 1), BinaryColor::Off);
        let _ = Line::new(
            Point::new(0, TITLE_HEIGHT),
            Point::new(SCREEN_WIDTH - 1, TITLE_HEIGHT),
        )
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target);

        let items = self.current.items;
        let end = (self.scroll + VISIBLE_ITEMS).min(items.len());
        for (row, i) in (self.scroll..end).enumerate() {
            let y = TITLE_HEIGHT + 3 + row as i32 * ITEM_HEIGHT;
            self.draw_item(target, view, &items[i], y, i == self.selected);
        }

        let right = SCREEN_WIDTH;
        if self.scroll > 0 {
            let _ = Triangle::new(
                Point::new(right - 8, TITLE_HEIGHT + 4),
                Point::new(right - 4, TITLE_HEIGHT + 4),
                Point::new(right - 6, TITLE_HEIGHT + 2),
            )
            .into_styled(on)
            .draw(target);
        }
        if self.scroll + VISIBLE_ITEMS < items.len() {
            let _ = Triangle::new(
                Point::new(right - 8, SCREEN_HEIGHT - 4),
                Point::new(right - 4, SCREEN_HEIGHT - 4),
                Point::new(right - 6, SCREEN_HEIGHT - 2),
            )
            .into_styled(on)
            .draw(target);
        }

        true
    }

    fn draw_item<D, V>(&self, target: &mut D, view: &V, item: &MenuItem, y: i32, selected: bool)
    where
        D: DrawTarget<Color = BinaryColor>,
        V: MenuView + ?Sized,
    {
        if selected {
            text::draw(target, ">", Point::new(LEFT_MARGIN, y), BinaryColor::On);
        }
        let label: String<24> = text::ellipsize(item.label, LABEL_MAX_CHARS);
        text::draw(target, &label, Point::new(LEFT_MARGIN + 8, y), BinaryColor::On);

        let value = match item.kind {
            ItemKind::Toggle(flag) => {
                let mut s = InfoText::new();
                let _ = s.push_str(if view.flag(flag) { "ON" } else { "OFF" });
                s
            }
            ItemKind::Submenu(_) => {
                let mut s = InfoText::new();
                let _ = s.push_str(">");
                s
            }
            ItemKind::Info(field) => view.info(field),
            ItemKind::Action(_) => InfoText::new(),
        };
        if !value.is_empty() {
            let x = SCREEN_WIDTH - RIGHT_MARGIN - text::width(&value);
            text::draw(target, &value, Point::new(x, y), BinaryColor::On);
        }
    }
}
