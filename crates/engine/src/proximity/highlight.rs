#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Item,
    Bot,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Item, Category::Bot];

    pub fn label(self) -> &'static str {
        match self {
            Category::Item => "item",
            Category::Bot => "bot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Highlight {
    Closest,
    Default,
}

impl Highlight {
    pub fn from_nearest(is_nearest: bool) -> Self {
        if is_nearest {
            Highlight::Closest
        } else {
            Highlight::Default
        }
    }
}

/// Linear RGBA, matching how engine materials take a tint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rgba({:.2}, {:.2}, {:.2}, {:.2})",
            self.r, self.g, self.b, self.a
        )
    }
}

/// Static per-category colors for the closest entity and everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightPalette {
    pub item_closest: Color,
    pub item_default: Color,
    pub bot_closest: Color,
    pub bot_default: Color,
}

impl Default for HighlightPalette {
    fn default() -> Self {
        Self {
            item_closest: Color::RED,
            item_default: Color::WHITE,
            bot_closest: Color::BLUE,
            bot_default: Color::GRAY,
        }
    }
}

impl HighlightPalette {
    pub fn color_for(&self, category: Category, highlight: Highlight) -> Color {
        match (category, highlight) {
            (Category::Item, Highlight::Closest) => self.item_closest,
            (Category::Item, Highlight::Default) => self.item_default,
            (Category::Bot, Highlight::Closest) => self.bot_closest,
            (Category::Bot, Highlight::Default) => self.bot_default,
        }
    }

    /// Reverse lookup used when reporting state; `None` for colors the
    /// palette never hands out for this category.
    pub fn highlight_of(&self, category: Category, color: Color) -> Option<Highlight> {
        if color == self.color_for(category, Highlight::Closest) {
            Some(Highlight::Closest)
        } else if color == self.color_for(category, Highlight::Default) {
            Some(Highlight::Default)
        } else {
            None
        }
    }
}
