//! JavaScript snippets evaluated in the page by `CdpDriver`.
//!
//! `__SEL__` is replaced with a JSON string literal of the selector; other
//! placeholders are documented per snippet.

use serde_json::Value;

/// Quote a Rust string as a JS string literal.
pub(crate) fn js_string(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

/// Substitute the selector (and any extra `(placeholder, literal)` pairs).
pub(crate) fn render(template: &str, selector: &str, extra: &[(&str, String)]) -> String {
    let mut js = template.replace("__SEL__", &js_string(selector));
    for (placeholder, value) in extra {
        js = js.replace(placeholder, value);
    }
    js
}

/// Visibility test shared by several snippets. Mirrors what a user can see:
/// attached, non-empty box, not `visibility: hidden` / `display: none`.
const IS_VISIBLE_FN: &str = r#"
function __isVisible(el) {
    if (!el || !el.isConnected) return false;
    var s = window.getComputedStyle(el);
    if (s.visibility === 'hidden' || s.display === 'none') return false;
    var r = el.getBoundingClientRect();
    return r.width > 0 && r.height > 0;
}
"#;

/// Poll (100ms) until the selector matches a visible element.
/// `__TIMEOUT__`: milliseconds.
pub(crate) const WAIT_VISIBLE_JS: &str = r#"
(function waitVisible() {
    __IS_VISIBLE__
    var selector = __SEL__;
    return new Promise(function(resolve, reject) {
        var deadline = Date.now() + __TIMEOUT__;
        function check() {
            if (__isVisible(document.querySelector(selector))) {
                resolve(true);
            } else if (Date.now() > deadline) {
                reject(new Error('Timed out after __TIMEOUT__ms waiting for ' + selector + ' to be visible'));
            } else {
                setTimeout(check, 100);
            }
        }
        check();
    });
})()
"#;

/// Poll (100ms) until `location.href` equals `__URL__`.
pub(crate) const WAIT_URL_JS: &str = r#"
(function waitUrl() {
    var expected = __URL__;
    return new Promise(function(resolve, reject) {
        var deadline = Date.now() + __TIMEOUT__;
        function check() {
            if (location.href === expected) {
                resolve(location.href);
            } else if (Date.now() > deadline) {
                reject(new Error('Timed out after __TIMEOUT__ms waiting for URL ' + expected + ' (at ' + location.href + ')'));
            } else {
                setTimeout(check, 100);
            }
        }
        check();
    });
})()
"#;

pub(crate) const CLICK_JS: &str = r#"
(function() {
    var el = document.querySelector(__SEL__);
    if (!el) throw new Error('No element matches ' + __SEL__);
    el.scrollIntoView({block: 'center', inline: 'center'});
    el.click();
    return true;
})()
"#;

/// Set an input's value through the native setter so framework-controlled
/// inputs (React) see the change. `__VALUE__`: JS string literal.
pub(crate) const FILL_JS: &str = r#"
(function() {
    var el = document.querySelector(__SEL__);
    if (!el) throw new Error('No element matches ' + __SEL__);
    var proto = el instanceof HTMLTextAreaElement
        ? HTMLTextAreaElement.prototype
        : HTMLInputElement.prototype;
    var setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    el.focus();
    setter.call(el, __VALUE__);
    el.dispatchEvent(new Event('input', {bubbles: true}));
    el.dispatchEvent(new Event('change', {bubbles: true}));
    return true;
})()
"#;

/// Pick an `<option>` by value. `__VALUE__`: JS string literal.
pub(crate) const SELECT_OPTION_JS: &str = r#"
(function() {
    var el = document.querySelector(__SEL__);
    if (!el) throw new Error('No element matches ' + __SEL__);
    var value = __VALUE__;
    var found = Array.prototype.some.call(el.options, function(o) { return o.value === value; });
    if (!found) throw new Error('No option ' + value + ' in ' + __SEL__);
    var setter = Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set;
    setter.call(el, value);
    el.dispatchEvent(new Event('input', {bubbles: true}));
    el.dispatchEvent(new Event('change', {bubbles: true}));
    return true;
})()
"#;

pub(crate) const VALUE_JS: &str = r#"
(function() {
    var el = document.querySelector(__SEL__);
    if (!el) throw new Error('No element matches ' + __SEL__);
    return el.value;
})()
"#;

pub(crate) const INNER_TEXT_JS: &str = r#"
(function() {
    var el = document.querySelector(__SEL__);
    if (!el) throw new Error('No element matches ' + __SEL__);
    return el.innerText;
})()
"#;

pub(crate) const ALL_INNER_TEXT_JS: &str = r#"
(function() {
    return Array.prototype.map.call(document.querySelectorAll(__SEL__), function(el) {
        return el.innerText;
    });
})()
"#;

/// `__NAME__`: attribute name as a JS string literal.
pub(crate) const ATTRIBUTE_JS: &str = r#"
(function() {
    var el = document.querySelector(__SEL__);
    return el ? el.getAttribute(__NAME__) : null;
})()
"#;

pub(crate) const ALL_ATTRIBUTES_JS: &str = r#"
(function() {
    return Array.prototype.map.call(document.querySelectorAll(__SEL__), function(el) {
        return el.getAttribute(__NAME__);
    });
})()
"#;

pub(crate) const IS_VISIBLE_JS: &str = r#"
(function() {
    __IS_VISIBLE__
    return __isVisible(document.querySelector(__SEL__));
})()
"#;

pub(crate) const IS_ENABLED_JS: &str = r#"
(function() {
    var el = document.querySelector(__SEL__);
    if (!el) throw new Error('No element matches ' + __SEL__);
    return !el.disabled && !el.closest('fieldset[disabled]');
})()
"#;

/// Editable = enabled, not read-only, and a form control or contenteditable.
pub(crate) const IS_EDITABLE_JS: &str = r#"
(function() {
    var el = document.querySelector(__SEL__);
    if (!el) throw new Error('No element matches ' + __SEL__);
    var control = el instanceof HTMLInputElement
        || el instanceof HTMLTextAreaElement
        || el instanceof HTMLSelectElement;
    if (!control && !el.isContentEditable) return false;
    return !el.disabled && !el.readOnly;
})()
"#;

/// Scroll the element into view, wait for its images to decode, and return
/// its box in document coordinates as `{x, y, width, height}`.
pub(crate) const ELEMENT_BOUNDS_JS: &str = r#"
(function elementBounds() {
    var el = document.querySelector(__SEL__);
    if (!el) return Promise.reject(new Error('No element matches ' + __SEL__));
    el.scrollIntoView({block: 'center', inline: 'center'});
    var imgs = el.tagName === 'IMG' ? [el] : Array.from(el.querySelectorAll('img'));
    var loads = imgs.map(function(img) {
        return img.complete ? Promise.resolve() : img.decode().catch(function() {});
    });
    return Promise.all(loads).then(function() {
        var r = el.getBoundingClientRect();
        return {
            x: r.left + window.scrollX,
            y: r.top + window.scrollY,
            width: r.width,
            height: r.height
        };
    });
})()
"#;

pub(crate) const LOCATION_JS: &str = "location.href";

/// Expand the shared helper into a snippet.
pub(crate) fn with_helpers(template: &str) -> String {
    template.replace("__IS_VISIBLE__", IS_VISIBLE_FN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_quoted_as_js_literal() {
        let js = render(CLICK_JS, r#"[data-test="login-button"]"#, &[]);
        assert!(js.contains(r#"document.querySelector("[data-test=\"login-button\"]")"#));
        assert!(!js.contains("__SEL__"));
    }

    #[test]
    fn extra_placeholders_are_substituted() {
        let js = render(
            FILL_JS,
            "#user-name",
            &[("__VALUE__", js_string("it's \"quoted\""))],
        );
        assert!(js.contains(r#"setter.call(el, "it's \"quoted\"")"#));
        assert!(!js.contains("__VALUE__"));
    }

    #[test]
    fn visibility_helper_is_inlined() {
        let js = render(&with_helpers(WAIT_VISIBLE_JS), ".inventory_list", &[("__TIMEOUT__", "5000".into())]);
        assert!(js.contains("function __isVisible(el)"));
        assert!(js.contains("Date.now() + 5000"));
        assert!(!js.contains("__IS_VISIBLE__"));
    }
}
