//! The navigation bar at the top of every page.

use maud::{Markup, html};

use crate::endpoints;

const LINK_STYLE: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100 \
    sm:hover:bg-transparent sm:border-0 sm:hover:text-blue-700 sm:p-0 \
    dark:text-white sm:dark:hover:text-blue-500 dark:hover:bg-gray-700";
const ACTIVE_LINK_STYLE: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm \
    sm:bg-transparent sm:text-blue-700 sm:p-0 dark:text-white sm:dark:text-blue-500";

/// A link in the navigation bar.
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
    signed_in_as: Option<&'a str>,
}

impl<'a> NavBar<'a> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active. `signed_in_as` is the email of the signed-in user,
    /// which adds a log-out link. It is `None` for the local snapshot.
    pub fn new(active_endpoint: &str, signed_in_as: Option<&'a str>) -> NavBar<'a> {
        let mut links = vec![Link {
            url: endpoints::DASHBOARD_VIEW,
            title: "Dashboard",
            is_current: active_endpoint == endpoints::DASHBOARD_VIEW,
        }];

        if signed_in_as.is_some() {
            links.push(Link {
                url: endpoints::LOG_OUT,
                title: "Log out",
                is_current: false,
            });
        }

        NavBar {
            links,
            signed_in_as,
        }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "💰 Finance Tracker"
                        }
                    }

                    ul
                        class="font-medium flex flex-row items-center gap-6 p-0
                        dark:bg-gray-900"
                    {
                        @if let Some(email) = self.signed_in_as {
                            li class="hidden sm:block text-sm text-gray-500 dark:text-gray-400"
                            {
                                (email)
                            }
                        }

                        @for link in self.links {
                            li {
                                a
                                    href=(link.url)
                                    class=(if link.is_current { ACTIVE_LINK_STYLE } else { LINK_STYLE })
                                    aria-current=[link.is_current.then_some("page")]
                                {
                                    (link.title)
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::endpoints;

    use super::NavBar;

    fn hrefs(nav: NavBar<'_>) -> Vec<String> {
        let html = Html::parse_fragment(&nav.into_html().into_string());
        html.select(&Selector::parse("ul a").unwrap())
            .map(|link| link.value().attr("href").unwrap_or_default().to_owned())
            .collect()
    }

    #[test]
    fn local_snapshot_has_no_log_out_link() {
        assert_eq!(
            hrefs(NavBar::new(endpoints::DASHBOARD_VIEW, None)),
            vec![endpoints::DASHBOARD_VIEW]
        );
    }

    #[test]
    fn signed_in_user_can_log_out() {
        assert_eq!(
            hrefs(NavBar::new(
                endpoints::DASHBOARD_VIEW,
                Some("alice@example.com")
            )),
            vec![endpoints::DASHBOARD_VIEW, endpoints::LOG_OUT]
        );
    }

    #[test]
    fn active_link_is_marked() {
        let nav = NavBar::new(endpoints::DASHBOARD_VIEW, None).into_html();
        let html = Html::parse_fragment(&nav.into_string());
        let current = html
            .select(&Selector::parse("a[aria-current=page]").unwrap())
            .next()
            .unwrap();

        assert_eq!(current.value().attr("href"), Some(endpoints::DASHBOARD_VIEW));
    }
}
