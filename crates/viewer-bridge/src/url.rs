//! Bootstrap URL for the viewer page
//!
//! The viewer reads its initial configuration from the query string and,
//! for navigation options, from the fragment. Parameter order is stable so
//! generated URLs can be compared in tests.

use crate::options::ViewerOptions;
use crate::transform::ViewerMode;

const VIEWER_PAGE: &str = "web/viewer.html";

struct UrlWriter {
    url: String,
}

impl UrlWriter {
    fn param(&mut self, key: &str, value: impl AsRef<str>) {
        self.url.push('&');
        self.url.push_str(key);
        self.url.push('=');
        self.url.push_str(&urlencoding::encode(value.as_ref()));
    }

    fn flag(&mut self, key: &str, value: Option<bool>) {
        if let Some(value) = value {
            self.param(key, if value { "true" } else { "false" });
        }
    }

    fn enabled(&mut self, key: &str, value: bool) {
        if value {
            self.param(key, "true");
        }
    }
}

/// Ensure the download name carries a `.pdf` extension
pub fn normalize_file_name(name: &str) -> String {
    if name.to_lowercase().ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{}.pdf", name)
    }
}

/// Compose the URL the iframe or external window is pointed at
pub fn build_viewer_url(options: &ViewerOptions) -> String {
    let folder = options.viewer_folder.trim_end_matches('/');
    let source = options.source.as_deref().unwrap_or_default();
    let mut w = UrlWriter {
        url: format!(
            "{}/{}?file={}",
            folder,
            VIEWER_PAGE,
            urlencoding::encode(source)
        ),
    };

    if let Some(id) = &options.viewer_id {
        w.param("viewerId", id);
    }
    w.enabled("beforePrint", options.events.before_print);
    w.enabled("afterPrint", options.events.after_print);
    w.enabled("pagesLoaded", options.events.pages_loaded);
    w.enabled("pageChange", options.events.page_change);

    if let Some(name) = &options.download_file_name {
        w.param("fileName", normalize_file_name(name));
    }
    w.flag("openFile", options.open_file);
    w.flag("download", options.download);
    w.flag("startDownload", options.start_download);
    w.flag("viewBookmark", options.view_bookmark);
    w.flag("print", options.print);
    w.flag("startPrint", options.start_print);
    w.flag("fullScreen", options.full_screen);
    w.flag("find", options.find);
    w.enabled("lastpage", options.last_page);
    w.enabled("rotatecw", options.rotate_cw);
    w.enabled("rotateccw", options.rotate_ccw);
    if let Some(cursor) = options.cursor_value() {
        w.param("cursor", cursor.as_url_param());
    }
    if let Some(scroll) = options.scroll_value() {
        w.param("scroll", scroll.as_url_param());
    }
    if let Some(spread) = options.spread_value() {
        w.param("spread", spread.as_url_param());
    }
    if let Some(locale) = &options.locale {
        w.param("locale", locale);
    }
    w.flag("useOnlyCssZoom", options.use_only_css_zoom);

    let zoom = options.zoom_value();
    let page_mode = options.page_mode_value();
    if options.page.is_some() || zoom.is_some() || options.named_dest.is_some() || page_mode.is_some()
    {
        w.url.push('#');
        if let Some(page) = options.page {
            w.param("page", page.to_string());
        }
        if let Some(zoom) = zoom {
            w.param("zoom", zoom.as_url_param());
        }
        if let Some(dest) = &options.named_dest {
            w.param("nameddest", dest);
        }
        if let Some(mode) = page_mode {
            w.param("pagemode", mode.as_url_param());
        }
    }

    if options.error_override || options.error_append {
        w.param("errorMessage", options.error_message.as_deref().unwrap_or_default());
        w.enabled("errorOverride", options.error_override);
        w.enabled("errorAppend", options.error_append);
    }

    w.url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EventSubscriptions;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_url() {
        let options = ViewerOptions::new("/files/a b.pdf");
        assert_eq!(
            build_viewer_url(&options),
            "assets/pdfjs/web/viewer.html?file=%2Ffiles%2Fa%20b.pdf"
        );
    }

    #[test]
    fn test_no_source_gives_empty_file() {
        let options = ViewerOptions::default().with_viewer_folder("/pdfjs/");
        assert_eq!(build_viewer_url(&options), "/pdfjs/web/viewer.html?file=");
    }

    #[test]
    fn test_full_parameter_order() {
        let mut options = ViewerOptions::new("doc.pdf")
            .with_viewer_id("v1")
            .with_events(EventSubscriptions {
                before_print: true,
                page_change: true,
                ..Default::default()
            })
            .with_page(3)
            .with_zoom("page-width");
        options.download_file_name = Some("report".to_string());
        options.download = Some(true);
        options.print = Some(false);
        options.last_page = true;
        options.cursor = Some("grab".to_string());
        options.locale = Some("de".to_string());
        options.page_mode = Some("thumbs".to_string());

        assert_eq!(
            build_viewer_url(&options),
            "assets/pdfjs/web/viewer.html?file=doc.pdf&viewerId=v1&beforePrint=true\
             &pageChange=true&fileName=report.pdf&download=true&print=false\
             &lastpage=true&cursor=HAND&locale=de#&page=3&zoom=page-width&pagemode=thumbs"
        );
    }

    #[test]
    fn test_error_message_params() {
        let options = ViewerOptions::new("x.pdf").with_error_message("Not found & gone", false);
        assert_eq!(
            build_viewer_url(&options),
            "assets/pdfjs/web/viewer.html?file=x.pdf\
             &errorMessage=Not%20found%20%26%20gone&errorAppend=true"
        );
    }

    #[test]
    fn test_file_name_keeps_existing_extension() {
        assert_eq!(normalize_file_name("a.PDF"), "a.PDF");
        assert_eq!(normalize_file_name("a"), "a.pdf");
    }
}
