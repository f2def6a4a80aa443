//! Manifest and `res/` XML

use super::TemplateParams;
use crate::escape::{android_string, xml_attr, xml_text};

/// `app/src/main/AndroidManifest.xml`
pub fn manifest(p: &TemplateParams<'_>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="{package}">
    <uses-permission android:name="android.permission.INTERNET" />
    <application
        android:allowBackup="true"
        android:icon="@mipmap/ic_launcher"
        android:label="@string/app_name"
        android:roundIcon="@mipmap/ic_launcher"
        android:supportsRtl="true"
        android:theme="@style/AppTheme">
        <activity
            android:name=".MainActivity"
            android:exported="true"
            android:configChanges="orientation|screenSize|keyboardHidden">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#,
        package = xml_attr(p.package_id),
    )
}

/// `res/values/strings.xml` carrying the app label
///
/// The label is literal text, so `%` sequences are not format arguments.
pub fn strings_xml(p: &TemplateParams<'_>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="app_name" formatted="false">{}</string>
</resources>
"#,
        android_string(p.app_name)
    )
}

/// `res/values/styles.xml`: dark theme plus the named colours
pub fn styles_xml(p: &TemplateParams<'_>) -> String {
    let t = p.theme;
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <style name="AppTheme" parent="Theme.MaterialComponents.DayNight.NoActionBar">
        <item name="colorPrimary">{primary}</item>
        <item name="colorPrimaryVariant">{primary_variant}</item>
        <item name="colorOnPrimary">{on_primary}</item>
        <item name="colorSecondary">{accent}</item>
        <item name="android:statusBarColor">{status_bar}</item>
        <item name="android:windowBackground">{background}</item>
        <item name="android:forceDarkAllowed">true</item>
    </style>
    <color name="neon_accent">{accent}</color>
    <color name="obsidian_bg">{background}</color>
</resources>
"#,
        primary = xml_text(&t.primary),
        primary_variant = xml_text(&t.primary_variant),
        on_primary = xml_text(&t.on_primary),
        accent = xml_text(&t.accent),
        status_bar = xml_text(&t.status_bar),
        background = xml_text(&t.background),
    )
}

/// `res/layout/activity_main.xml`
pub fn layout_xml(_p: &TemplateParams<'_>) -> String {
    r#"<?xml version="1.0" encoding="utf-8"?>
<androidx.coordinatorlayout.widget.CoordinatorLayout
    xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:app="http://schemas.android.com/apk/res-auto"
    android:layout_width="match_parent"
    android:layout_height="match_parent"
    android:background="@color/obsidian_bg">

    <com.google.android.material.appbar.AppBarLayout
        android:layout_width="match_parent"
        android:layout_height="wrap_content"
        android:theme="@style/ThemeOverlay.AppCompat.Dark.ActionBar">

        <androidx.appcompat.widget.Toolbar
            android:id="@+id/toolbar"
            android:layout_width="match_parent"
            android:layout_height="?attr/actionBarSize"
            android:background="@color/obsidian_bg"
            app:popupTheme="@style/ThemeOverlay.AppCompat.Light" />

        <ProgressBar
            android:id="@+id/progressBar"
            style="?android:attr/progressBarStyleHorizontal"
            android:layout_width="match_parent"
            android:layout_height="4dp"
            android:indeterminate="false"
            android:progressDrawable="@drawable/neon_progress"
            android:visibility="gone" />

    </com.google.android.material.appbar.AppBarLayout>

    <androidx.swiperefreshlayout.widget.SwipeRefreshLayout
        android:id="@+id/swipeRefresh"
        android:layout_width="match_parent"
        android:layout_height="match_parent"
        app:layout_behavior="@string/appbar_scrolling_view_behavior">

        <WebView
            android:id="@+id/webView"
            android:layout_width="match_parent"
            android:layout_height="match_parent" />

    </androidx.swiperefreshlayout.widget.SwipeRefreshLayout>

</androidx.coordinatorlayout.widget.CoordinatorLayout>
"#
    .to_string()
}

/// `res/drawable/neon_progress.xml`
pub fn progress_drawable_xml(p: &TemplateParams<'_>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<layer-list xmlns:android="http://schemas.android.com/apk/res/android">
    <item android:id="@android:id/background">
        <shape><solid android:color="{background}"/></shape>
    </item>
    <item android:id="@android:id/progress">
        <clip><shape><solid android:color="{accent}"/></shape></clip>
    </item>
</layer-list>
"#,
        background = xml_attr(&p.theme.background),
        accent = xml_attr(&p.theme.accent),
    )
}

/// `res/menu/main_menu.xml`
pub fn menu_xml(_p: &TemplateParams<'_>) -> String {
    r#"<?xml version="1.0" encoding="utf-8"?>
<menu xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:app="http://schemas.android.com/apk/res-auto">
    <item android:id="@+id/action_share" android:title="Share" app:showAsAction="never" />
    <item android:id="@+id/action_clear" android:title="Clear Cache" app:showAsAction="never" />
    <item android:id="@+id/action_home" android:title="Back to Home" app:showAsAction="never" />
</menu>
"#
    .to_string()
}
