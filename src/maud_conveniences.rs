use crate::config::preferences::Preferences;
use maud::{Markup, Render, html};

/// Tailwind classes that change with the theme.
#[derive(Debug, Copy, Clone)]
pub struct Palette {
    pub page: &'static str,
    pub panel: &'static str,
    pub heading: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub input: &'static str,
    pub input_border: &'static str,
    pub table_head: &'static str,
    pub row_hover: &'static str,
}

impl Palette {
    pub const LIGHT: Self = Self {
        page: "bg-slate-100",
        panel: "bg-white",
        heading: "text-slate-800",
        text: "text-slate-700",
        muted: "text-slate-500",
        input: "bg-white",
        input_border: "border-slate-300",
        table_head: "bg-slate-100 text-slate-700",
        row_hover: "hover:bg-slate-50",
    };

    pub const DARK: Self = Self {
        page: "bg-slate-900",
        panel: "bg-slate-800",
        heading: "text-white",
        text: "text-slate-300",
        muted: "text-slate-400",
        input: "bg-slate-700 text-white placeholder-slate-400",
        input_border: "border-slate-600",
        table_head: "bg-slate-700 text-slate-300",
        row_hover: "hover:bg-slate-700",
    };

    pub const fn for_preferences(preferences: Preferences) -> Self {
        if preferences.dark_mode {
            Self::DARK
        } else {
            Self::LIGHT
        }
    }
}

pub fn render_table<const N: usize>(
    palette: Palette,
    titles: [&'static str; N],
    items: Vec<[Markup; N]>,
) -> Markup {
    html! {
        div class="overflow-x-auto" {
            table class="w-full" {
                thead class=(palette.table_head) {
                    tr {
                        @for title in titles {
                            th class="px-4 md:px-6 py-3 text-left text-xs font-semibold uppercase tracking-wider" {(title)}
                        }
                    }
                }
                tbody class="divide-y divide-slate-200" {
                    @for row in items {
                        tr class=(palette.row_hover) {
                            @for col in row {
                                td class={"px-4 md:px-6 py-4 whitespace-nowrap text-sm " (palette.text)} {(col)}
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn title(palette: Palette, s: impl Render) -> Markup {
    html! {
        h1 class={"text-xl sm:text-2xl md:text-3xl font-bold " (palette.heading)} {(s)}
    }
}

pub fn subtitle(palette: Palette, s: impl Render) -> Markup {
    html! {
        h2 class={"text-base sm:text-lg font-semibold mb-4 " (palette.text)} {(s)}
    }
}

#[derive(Debug, Copy, Clone)]
pub enum NoticeKind {
    Problem,
    Warning,
    Success,
}

pub fn notice(kind: NoticeKind, s: impl Render) -> Markup {
    let class = match kind {
        NoticeKind::Problem => "bg-red-100 border border-red-400 text-red-700",
        NoticeKind::Warning => "bg-amber-100 border border-amber-400 text-amber-800",
        NoticeKind::Success => "bg-emerald-100 border border-emerald-400 text-emerald-800",
    };

    html! {
        div class={(class) " px-4 py-3 rounded relative mb-4"} role="alert" {
            (s)
        }
    }
}
