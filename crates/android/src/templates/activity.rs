//! The single activity wrapping the WebView

use super::{TemplateParams, argb_literal};
use crate::escape::java_string;

/// `app/src/main/java/<package path>/MainActivity.java`
pub fn main_activity_java(p: &TemplateParams<'_>) -> String {
    format!(
        r#"package {package};

import android.content.Intent;
import android.graphics.Bitmap;
import android.os.Bundle;
import android.view.HapticFeedbackConstants;
import android.view.Menu;
import android.view.MenuItem;
import android.view.View;
import android.webkit.WebChromeClient;
import android.webkit.WebResourceRequest;
import android.webkit.WebSettings;
import android.webkit.WebView;
import android.webkit.WebViewClient;
import android.widget.ProgressBar;
import androidx.appcompat.app.AppCompatActivity;
import androidx.appcompat.widget.Toolbar;
import androidx.swiperefreshlayout.widget.SwipeRefreshLayout;

public class MainActivity extends AppCompatActivity {{

    private static final String TARGET_URL = "{url}";

    private WebView webView;
    private SwipeRefreshLayout swipeRefresh;
    private ProgressBar progressBar;

    @Override
    protected void onCreate(Bundle savedInstanceState) {{
        super.onCreate(savedInstanceState);
        setContentView(R.layout.activity_main);

        Toolbar toolbar = findViewById(R.id.toolbar);
        setSupportActionBar(toolbar);

        progressBar = findViewById(R.id.progressBar);
        swipeRefresh = findViewById(R.id.swipeRefresh);
        webView = findViewById(R.id.webView);

        setupWebView();
        setupSwipeRefresh();

        if (savedInstanceState == null) {{
            webView.loadUrl(TARGET_URL);
        }} else {{
            webView.restoreState(savedInstanceState);
        }}
    }}

    @Override
    protected void onSaveInstanceState(Bundle outState) {{
        super.onSaveInstanceState(outState);
        webView.saveState(outState);
    }}

    @SuppressWarnings("deprecation")
    private void setupWebView() {{
        WebSettings settings = webView.getSettings();
        settings.setJavaScriptEnabled(true);
        settings.setDomStorageEnabled(true);
        if (android.os.Build.VERSION.SDK_INT >= android.os.Build.VERSION_CODES.Q) {{
            settings.setForceDark(WebSettings.FORCE_DARK_ON);
        }}

        webView.setWebViewClient(new WebViewClient() {{
            @Override
            public void onPageStarted(WebView view, String url, Bitmap favicon) {{
                progressBar.setVisibility(View.VISIBLE);
                progressBar.setProgress(0);
            }}

            @Override
            public void onPageFinished(WebView view, String url) {{
                progressBar.setVisibility(View.GONE);
                swipeRefresh.setRefreshing(false);
            }}

            @Override
            public boolean shouldOverrideUrlLoading(WebView view, WebResourceRequest request) {{
                return false;
            }}
        }});

        webView.setWebChromeClient(new WebChromeClient() {{
            @Override
            public void onProgressChanged(WebView view, int newProgress) {{
                progressBar.setProgress(newProgress);
            }}
        }});
    }}

    private void setupSwipeRefresh() {{
        swipeRefresh.setColorSchemeColors({accent});
        swipeRefresh.setProgressBackgroundColorSchemeColor({background});
        swipeRefresh.setOnRefreshListener(() -> {{
            swipeRefresh.performHapticFeedback(HapticFeedbackConstants.VIRTUAL_KEY);
            webView.reload();
        }});
    }}

    @Override
    public boolean onCreateOptionsMenu(Menu menu) {{
        getMenuInflater().inflate(R.menu.main_menu, menu);
        return true;
    }}

    @Override
    public boolean onOptionsItemSelected(MenuItem item) {{
        int id = item.getItemId();
        if (id == R.id.action_share) {{
            Intent shareIntent = new Intent(Intent.ACTION_SEND);
            shareIntent.setType("text/plain");
            shareIntent.putExtra(Intent.EXTRA_TEXT, webView.getUrl());
            startActivity(Intent.createChooser(shareIntent, "Share via"));
            return true;
        }} else if (id == R.id.action_clear) {{
            webView.clearCache(true);
            webView.reload();
            return true;
        }} else if (id == R.id.action_home) {{
            webView.loadUrl(TARGET_URL);
            return true;
        }}
        return super.onOptionsItemSelected(item);
    }}

    @Override
    public void onBackPressed() {{
        if (webView.canGoBack()) {{
            webView.goBack();
        }} else {{
            super.onBackPressed();
        }}
    }}
}}
"#,
        package = p.package_id,
        url = java_string(p.target_url),
        accent = argb_literal(&p.theme.accent),
        background = argb_literal(&p.theme.background),
    )
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[test]
    fn test_main_activity_snapshot() {
        let req = fixtures::quoted_request();
        let config = fixtures::config();
        let params = TemplateParams::new(&req, &config);
        insta::assert_snapshot!("main_activity_java", main_activity_java(&params));
    }

    #[test]
    fn test_activity_package_and_url() {
        let req = fixtures::request("Shop", "https://example.com/store");
        let config = fixtures::config();
        let out = main_activity_java(&TemplateParams::new(&req, &config));
        assert!(out.starts_with("package com.shop.web;\n"));
        assert!(out.contains("TARGET_URL = \"https://example.com/store\";"));
        assert!(out.contains("setJavaScriptEnabled(true)"));
        assert!(out.contains("setDomStorageEnabled(true)"));
        assert!(out.contains("webView.goBack()"));
    }

    #[test]
    fn test_activity_url_cannot_break_out_of_literal() {
        let req = fixtures::request("x", "https://example.com/\\\";System.exit(0);//");
        let config = fixtures::config();
        let out = main_activity_java(&TemplateParams::new(&req, &config));
        let line = out
            .lines()
            .find(|l| l.contains("TARGET_URL ="))
            .unwrap();
        // The URL parser percent-encodes the quote; backslash becomes a path separator.
        assert!(!line.contains("\";System"));
        assert!(line.trim_end().ends_with("\";"));
    }

    #[test]
    fn test_activity_theme_colours() {
        let req = fixtures::request("x", "https://example.com");
        let config = fixtures::config();
        let out = main_activity_java(&TemplateParams::new(&req, &config));
        assert!(out.contains("setColorSchemeColors(0xFF00E5FF)"));
        assert!(out.contains("setProgressBackgroundColorSchemeColor(0xFF121212)"));
    }
}
