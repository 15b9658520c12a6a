use once_cell::sync::Lazy;

use crate::router::{Route, SearchQuery};

/// Genre slugs the catalog supports, with their display names
pub const GENRES: &[(&str, &str)] = &[
    ("Hành Động", "hanh-dong"),
    ("Cổ Trang", "co-trang"),
    ("Tình Cảm", "tinh-cam"),
    ("Viễn Tưởng", "vien-tuong"),
    ("Kinh Dị", "kinh-di"),
    ("Hài Hước", "hai-huoc"),
    ("Hoạt Hình", "hoat-hinh"),
    ("Tài Liệu", "tai-lieu"),
];

/// Listing types exposed by `/v1/api/danh-sach/{type}`
pub const TYPES: &[(&str, &str)] = &[
    ("Phim bộ", "phim-bo"),
    ("Phim lẻ", "phim-le"),
    ("Hoạt hình", "hoat-hinh"),
    ("TV Shows", "tv-shows"),
];

pub fn genre_display_name(slug: &str) -> Option<&'static str> {
    GENRES.iter().find(|(_, s)| *s == slug).map(|(n, _)| *n)
}

pub fn type_display_name(slug: &str) -> Option<&'static str> {
    TYPES.iter().find(|(_, s)| *s == slug).map(|(n, _)| *n)
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavTarget {
    Go(Route),
    Genres,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavItem {
    pub label: &'static str,
    pub target: NavTarget,
}

static MAIN_ITEMS: Lazy<Vec<NavItem>> = Lazy::new(|| {
    let mut items = vec![NavItem {
        label: "Trang chủ",
        target: NavTarget::Go(Route::Home),
    }];
    items.extend(TYPES.iter().map(|(label, slug)| NavItem {
        label: *label,
        target: NavTarget::Go(Route::Search(SearchQuery::kind(*slug))),
    }));
    items.push(NavItem {
        label: "Thể loại",
        target: NavTarget::Genres,
    });
    items.push(NavItem {
        label: "Thư viện",
        target: NavTarget::Go(Route::Library),
    });
    items
});

static GENRE_ITEMS: Lazy<Vec<NavItem>> = Lazy::new(|| {
    GENRES
        .iter()
        .map(|(label, slug)| NavItem {
            label: *label,
            target: NavTarget::Go(Route::Search(SearchQuery::category(*slug))),
        })
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuSection {
    #[default]
    Main,
    Genres,
}

#[derive(Debug, Clone, Default)]
pub struct MenuState {
    pub open: bool,
    pub section: MenuSection,
    pub selected: usize,
}

impl MenuState {
    pub fn items(&self) -> &'static [NavItem] {
        match self.section {
            MenuSection::Main => &MAIN_ITEMS,
            MenuSection::Genres => &GENRE_ITEMS,
        }
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open = true;
            self.section = MenuSection::Main;
            self.selected = 0;
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.section = MenuSection::Main;
        self.selected = 0;
    }

    pub fn next(&mut self) {
        let len = self.items().len();
        self.selected = (self.selected + 1) % len;
    }

    pub fn previous(&mut self) {
        let len = self.items().len();
        self.selected = (self.selected + len - 1) % len;
    }

    /// Esc: leave the genre list first, then the menu
    pub fn back(&mut self) {
        match self.section {
            MenuSection::Genres => {
                self.section = MenuSection::Main;
                self.selected = MAIN_ITEMS
                    .iter()
                    .position(|i| i.target == NavTarget::Genres)
                    .unwrap_or(0);
            }
            MenuSection::Main => self.close(),
        }
    }

    /// Activate the highlighted entry; a route closes the menu
    pub fn activate(&mut self) -> Option<Route> {
        let item = self.items().get(self.selected)?;
        match &item.target {
            NavTarget::Genres => {
                self.section = MenuSection::Genres;
                self.selected = 0;
                None
            }
            NavTarget::Go(route) => {
                let route = route.clone();
                self.close();
                Some(route)
            }
        }
    }
}
