//! ensure serde is working as expected

use super::*;

#[test]
fn test_serde() {
    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Eq)]
    struct MyTypes {
        f1: F2Dot14,
        f2: F4Dot12,
        f3: F6Dot10,
        gid16: GlyphId16,
        gid: GlyphId,
        fword: FWord,
        u24: Uint24,
    }

    let my_instance = MyTypes {
        f1: F2Dot14::from_f32(1.2),
        f2: F4Dot12::from_f32(-0.25),
        f3: F6Dot10::from_f32(3.5),
        gid16: GlyphId16::new(69),
        gid: GlyphId::new(70_000),
        fword: FWord::new(-120),
        u24: Uint24::new(16_777_215),
    };

    let dumped = serde_json::to_string(&my_instance).unwrap();
    let loaded: MyTypes = serde_json::from_str(&dumped).unwrap();

    assert_eq!(my_instance, loaded)
}
