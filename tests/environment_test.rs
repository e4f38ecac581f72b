use glb_viewer::resources::environment::EquirectImage;

mod common;

fn studio() -> Vec<u8> {
    // 4x2 panorama: a bright left half and a dim right half
    #[rustfmt::skip]
    let texels = [
        [2.0, 2.0, 2.0], [1.0, 1.0, 1.0], [0.5, 0.5, 0.5], [0.25, 0.25, 0.25],
        [2.0, 2.0, 2.0], [1.0, 1.0, 1.0], [0.5, 0.5, 0.5], [0.25, 0.25, 0.25],
    ];
    common::hdr(4, 2, &texels)
}

#[test]
fn should_decode_radiance_hdr_to_linear_floats() {
    let image = EquirectImage::decode(&studio()).unwrap();

    assert_eq!((image.width, image.height), (4, 2));
    assert_eq!(image.texels.len(), 8);
    assert_eq!(image.texel(0, 0), [2.0, 2.0, 2.0, 1.0]);
    assert_eq!(image.texel(3, 1), [0.25, 0.25, 0.25, 1.0]);
}

#[test]
fn should_clamp_texel_lookups_to_the_image() {
    let image = EquirectImage::decode(&studio()).unwrap();
    assert_eq!(image.texel(10, 10), image.texel(3, 1));
}

#[test]
fn should_box_filter_when_downsampling() {
    let image = EquirectImage::decode(&studio()).unwrap();
    let half = image.downsample();

    assert_eq!((half.width, half.height), (2, 1));
    assert_eq!(half.texel(0, 0), [1.5, 1.5, 1.5, 1.0]);
    assert_eq!(half.texel(1, 0), [0.375, 0.375, 0.375, 1.0]);
}

#[test]
fn should_build_mip_chain_down_to_one_texel() {
    let image = EquirectImage::decode(&studio()).unwrap();
    let chain = image.mip_chain();

    let sizes: Vec<_> = chain.iter().map(|level| (level.width, level.height)).collect();
    assert_eq!(sizes, vec![(4, 2), (2, 1), (1, 1)]);
    assert_eq!(image.mip_level_count(), chain.len() as u32);
    // the last level is the average of the whole panorama
    assert_eq!(chain[2].texel(0, 0), [0.9375, 0.9375, 0.9375, 1.0]);
}

#[test]
fn should_reject_non_hdr_bytes() {
    assert!(EquirectImage::decode(b"#?RADIANCE but truncated").is_err());
    assert!(EquirectImage::decode(&[]).is_err());
}
