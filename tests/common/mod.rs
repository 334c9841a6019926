//! Shared fixture: a channel repository, shared SDKs, an Android SDK and an
//! exported project, with shell stubs standing in for the toolchain.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const TABLE: &str = r#"
keys = ["CH_BUILD_ID", "PACKAGE_NAME", "CHANNEL_SDKS", "CHANNEL"]
rows = [
    ["A", "com.game.a", "Pay", "channel_a"],
    ["B", "com.game.b", "", "channel_b"],
]
"#;

pub const MAIN_MANIFEST: &str = r#"<manifest package="com.example.game">
  <meta-data android:name="CHANNEL" android:value="CHANNEL" />
</manifest>
"#;

pub fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Lays out a channel repository, shared SDKs, an Android SDK and an
/// exported project under `root`.
pub fn fixture(root: &Path) {
    write(&root.join("ChannelConfigs.toml"), TABLE);
    write(
        &root.join("Channels/Android/A/_main/res/strings.xml"),
        "channel A strings",
    );

    let sdks = root.join("SharedLibraries/SDKs");
    write(
        &sdks.join("_Android/Pay/AndroidManifest.xml"),
        "<manifest package=\"net.comtavie.channelpay\" />\n",
    );
    write(&sdks.join("_Android/Pay/src/Pay.java"), "class Pay {}");
    write(&sdks.join("_Android/Pay/assets/pay.cfg"), "pay");
    write(&sdks.join("ChannelSdk/Editor/ChannelActivity.java"), "activity");
    write(&sdks.join("ChannelSdk/Editor/ChannelApplication.java"), "application");

    fs::create_dir_all(root.join("android-sdk/build-tools/26.0.2")).unwrap();

    let project = root.join("out/Game.apk_prj");
    write(&project.join("Game/AndroidManifest.xml"), MAIN_MANIFEST);
    write(&project.join("Game/res/strings.xml"), "stock strings");
    write(&project.join("Game/assets/game.dat"), "game");
    write(&project.join("Game/project.properties"), "target=android-22\n");
    write(
        &project.join("ChannelSdk/project.properties"),
        "android.library=true\n",
    );
    fs::create_dir_all(project.join("ChannelSdk/src")).unwrap();
}

/// Toolchain templates that copy files around instead of building.
pub const BUNDLER_TOML: &str = r#"
[android.commands]
update-lib-project = "true"
merge-manifest = 'cp "{{main}}" "{{out}}"'
build = "mkdir -p bin && cat AndroidManifest.xml res/strings.xml > bin/Game-release-unsigned.apk"
sign = "cp Game-release-unsigned.apk Game-release-unaligned.apk"
align = "cp Game-release-unaligned.apk Game-release.apk"
"#;

pub const IOS_TABLE: &str = r#"
keys = ["CH_BUILD_ID", "PACKAGE_NAME", "CHANNEL_SDKS", "CHANNEL", "APP_NAME"]
rows = [
    ["A", "com.game.a", "Pay", "channel_a", "Alpha Game"],
    ["B", "com.game.b", "", "channel_b", ""],
]
"#;

pub const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleDisplayName</key>
	<string>Game</string>
	<key>CFBundleIdentifier</key>
	<string>com.example.game</string>
	<key>ChannelName</key>
	<string>CHANNEL</string>
</dict>
</plist>
"#;

pub const CHANNEL_JSON: &str = r#"{"channel": "CHANNEL", "package": "PACKAGE_NAME"}"#;

/// Exported Xcode project with one target and two configurations.
pub const PBXPROJ: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	objects = {

/* Begin PBXBuildFile section */
		A00000000000000000000001 /* Data in Resources */ = {isa = PBXBuildFile; fileRef = A00000000000000000000002 /* Data */; };
/* End PBXBuildFile section */

/* Begin PBXFileReference section */
		A00000000000000000000002 /* Data */ = {isa = PBXFileReference; lastKnownFileType = folder; path = Data; sourceTree = "<group>"; };
/* End PBXFileReference section */

/* Begin PBXGroup section */
		29B97314FDCFA39411CA2CEA /* CustomTemplate */ = {
			isa = PBXGroup;
			children = (
				A00000000000000000000002 /* Data */,
			);
			name = CustomTemplate;
			sourceTree = "<group>";
		};
/* End PBXGroup section */

/* Begin PBXNativeTarget section */
		1D6058900D05DD3D006BFB54 /* Unity-iPhone */ = {
			isa = PBXNativeTarget;
			buildConfigurationList = 1D6058960D05DD3E006BFB54 /* Build configuration list for PBXNativeTarget "Unity-iPhone" */;
			buildPhases = (
				1D60588D0D05DD3D006BFB54 /* Resources */,
			);
			name = "Unity-iPhone";
			productName = "Unity-iPhone";
		};
/* End PBXNativeTarget section */

/* Begin PBXProject section */
		29B97313FDCFA39411CA2CEA /* Project object */ = {
			isa = PBXProject;
			knownRegions = (
				English,
				en,
			);
			mainGroup = 29B97314FDCFA39411CA2CEA /* CustomTemplate */;
		};
/* End PBXProject section */

/* Begin PBXResourcesBuildPhase section */
		1D60588D0D05DD3D006BFB54 /* Resources */ = {
			isa = PBXResourcesBuildPhase;
			files = (
				A00000000000000000000001 /* Data in Resources */,
			);
		};
/* End PBXResourcesBuildPhase section */

/* Begin XCBuildConfiguration section */
		1D6058940D05DD3E006BFB54 /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				CODE_SIGN_IDENTITY = "iPhone Developer";
				OTHER_CFLAGS = (
					"$(inherited)",
					"-DSDK_HAS_CHANNEL_APP_CONTROLLER=0",
				);
				PRODUCT_NAME = "$(TARGET_NAME)";
			};
			name = Debug;
		};
		1D6058950D05DD3E006BFB54 /* Release */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				PRODUCT_NAME = "$(TARGET_NAME)";
			};
			name = Release;
		};
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
		1D6058960D05DD3E006BFB54 /* Build configuration list for PBXNativeTarget "Unity-iPhone" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				1D6058940D05DD3E006BFB54 /* Debug */,
				1D6058950D05DD3E006BFB54 /* Release */,
			);
			defaultConfigurationName = Release;
		};
/* End XCConfigurationList section */
	};
	rootObject = 29B97313FDCFA39411CA2CEA /* Project object */;
}
"#;

pub const PROFILE_UUID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

/// Signed profile text: the embedded plist is all that is read.
pub fn profile(app_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>Entitlements</key>
	<dict>
		<key>application-identifier</key>
		<string>ABCDE12345.{app_id}</string>
		<key>com.apple.developer.team-identifier</key>
		<string>ABCDE12345</string>
	</dict>
	<key>Name</key>
	<string>Game Distribution</string>
	<key>UUID</key>
	<string>{PROFILE_UUID}</string>
</dict>
</plist>"#
    )
}

/// Lays out an iOS channel repository and an exported Xcode project under
/// `root`. Channel `A` ships a controller SDK, a replaced source file and a
/// localization; `B` ships nothing but signing material.
pub fn ios_fixture(root: &Path) {
    write(&root.join("ChannelConfigs_iOS.toml"), IOS_TABLE);

    for id in ["A", "B"] {
        let signing = root.join("Channels/iOS").join(id).join("mobileprovision");
        write(
            &signing.join("Release_pw.p12"),
            "friendlyName: iPhone Distribution: Studio Ltd (ABCDE12345)\n",
        );
        write(
            &signing.join("Debug_pw.p12"),
            "friendlyName: iPhone Developer: Dev One (ABCDE12345)\n",
        );
        write(&signing.join("Release.mobileprovision"), &profile("com.game.*"));
        write(&signing.join("Debug.mobileprovision"), &profile("com.game.*"));
    }
    let channel_a = root.join("Channels/iOS/A");
    write(
        &channel_a.join("xcode_prj/Classes/UnityAppController.mm"),
        "channel A controller",
    );
    write(
        &channel_a.join("Localization/ja.lproj/InfoPlist.strings"),
        "CFBundleDisplayName = \"Alpha\";",
    );
    write(
        &root.join("SharedLibraries/SDKs/Pay/iOS/ChannelAppController.mm"),
        "controller",
    );

    let project = root.join("out/Xcode");
    write(&project.join("Info.plist"), INFO_PLIST);
    write(&project.join("Libraries/channel_ios.json"), CHANNEL_JSON);
    write(
        &project.join("Unity-iPhone.xcodeproj/project.pbxproj"),
        PBXPROJ,
    );
    write(
        &project.join("Classes/UnityAppController.mm"),
        "stock controller",
    );
    fs::create_dir_all(root.join("share")).unwrap();
}

/// iOS templates: the "ipa" is the patched project files concatenated.
pub const IOS_BUNDLER_TOML: &str = r#"
[ios]
profile-store = "store"

[ios.commands]
pkcs12-dump = 'cat "{{p12}}"'
import-credential = "true"
import-certificate = "true"
clean = "true"
build = "true"
package = 'cat Info.plist Libraries/channel_ios.json Unity-iPhone.xcodeproj/project.pbxproj > "{{ipa}}"'
resign = 'cp "{{ipa}}" "{{resigned}}"'
"#;
