//! Gradle settings, properties and the app module build script

use super::TemplateParams;
use crate::escape::{groovy_string, properties_value};

/// `settings.gradle`
pub fn settings_gradle(p: &TemplateParams<'_>) -> String {
    format!(
        "rootProject.name = '{}'\ninclude ':app'\n",
        groovy_string(p.identifier)
    )
}

/// `local.properties` pointing at the Android SDK
pub fn local_properties(p: &TemplateParams<'_>) -> String {
    format!(
        "sdk.dir={}\n",
        properties_value(&p.android.sdk_dir.to_string_lossy())
    )
}

/// `gradle.properties`
pub fn gradle_properties(p: &TemplateParams<'_>) -> String {
    format!(
        "org.gradle.jvmargs={}\nandroid.useAndroidX=true\n",
        properties_value(&p.android.jvm_args)
    )
}

/// `app/build.gradle`
pub fn app_build_gradle(p: &TemplateParams<'_>) -> String {
    let a = p.android;
    let package = groovy_string(p.package_id);
    format!(
        r#"buildscript {{
    repositories {{
        google()
        mavenCentral()
    }}
    dependencies {{
        classpath 'com.android.tools.build:gradle:{agp}'
    }}
}}

apply plugin: 'com.android.application'

android {{
    namespace '{package}'
    compileSdk {compile_sdk}

    defaultConfig {{
        applicationId '{package}'
        minSdk {min_sdk}
        targetSdk {target_sdk}
        versionCode {version_code}
        versionName '{version_name}'
    }}

    buildTypes {{
        release {{
            minifyEnabled false
            proguardFiles getDefaultProguardFile('proguard-android-optimize.txt'), 'proguard-rules.pro'
        }}
    }}
    compileOptions {{
        sourceCompatibility JavaVersion.VERSION_1_8
        targetCompatibility JavaVersion.VERSION_1_8
    }}
}}

repositories {{
    google()
    mavenCentral()
}}

dependencies {{
    implementation 'androidx.appcompat:appcompat:1.6.1'
    implementation 'com.google.android.material:material:1.9.0'
    implementation 'androidx.swiperefreshlayout:swiperefreshlayout:1.1.0'
}}
"#,
        agp = groovy_string(&a.agp_version),
        package = package,
        compile_sdk = a.compile_sdk,
        min_sdk = a.min_sdk,
        target_sdk = a.target_sdk,
        version_code = a.version_code,
        version_name = groovy_string(&a.version_name),
    )
}
