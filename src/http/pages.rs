//! Server-rendered HTML pages.

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="icon" href="/favicon.ico">
<link rel="stylesheet" href="/static/style.css">
<title>ddns-agent</title>
</head>
"#;

/// Login page. On first start the same form creates the credentials.
pub fn login(first_time: bool, version: &str) -> String {
    let (title, button) = if first_time {
        ("Create an account", "Create")
    } else {
        ("Sign in", "Sign in")
    };
    format!(
        r#"{HEAD}<body class="login">
<form method="post" action="/loginFunc" id="login">
<h1>{title}</h1>
<input name="username" placeholder="Username" autocomplete="username" required>
<input name="password" type="password" placeholder="Password" autocomplete="current-password" required>
<button type="submit">{button}</button>
<p class="error" id="error"></p>
</form>
<footer>{version}</footer>
<script src="/static/app.js"></script>
</body>
</html>
"#,
        version = escape(version),
    )
}

/// Configuration editor with the current settings pre-filled.
pub fn index(config_json: &str, version: &str) -> String {
    format!(
        r#"{HEAD}<body>
<header>
<h1>ddns-agent</h1>
<a href="/logout">Logout</a>
</header>
<main>
<section>
<h2>Configuration</h2>
<textarea id="config" spellcheck="false">{config}</textarea>
<button id="save">Save</button>
<button id="webhook-test">Test webhook</button>
<p id="status"></p>
</section>
<section>
<h2>Logs</h2>
<pre id="logs"></pre>
<button id="clear-logs">Clear</button>
</section>
</main>
<footer>{version}</footer>
<script src="/static/app.js"></script>
</body>
</html>
"#,
        config = escape(config_json),
        version = escape(version),
    )
}

/// Minimal HTML escaping for text content and attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
