/// Unit tests for swapchain parameter selection
///
/// Surface capabilities are plain structs, so no GPU is needed.

use super::*;

fn capabilities(min: u32, max: u32, current: vk::Extent2D) -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
        min_image_count: min,
        max_image_count: max,
        current_extent: current,
        min_image_extent: vk::Extent2D { width: 64, height: 64 },
        max_image_extent: vk::Extent2D { width: 4096, height: 2048 },
        ..Default::default()
    }
}

#[test]
fn test_extent_follows_surface_when_fixed() {
    let caps = capabilities(2, 8, vk::Extent2D { width: 800, height: 600 });
    assert_eq!(choose_extent(&caps, 1920, 1080), vk::Extent2D { width: 800, height: 600 });
}

#[test]
fn test_extent_clamps_requested_size_when_surface_is_flexible() {
    let caps = capabilities(2, 8, vk::Extent2D { width: u32::MAX, height: u32::MAX });
    assert_eq!(choose_extent(&caps, 1280, 720), vk::Extent2D { width: 1280, height: 720 });
    assert_eq!(choose_extent(&caps, 8000, 10), vk::Extent2D { width: 4096, height: 64 });
}

#[test]
fn test_image_count_is_min_plus_one_capped() {
    assert_eq!(choose_image_count(&capabilities(2, 8, vk::Extent2D::default())), 3);
    assert_eq!(choose_image_count(&capabilities(3, 3, vk::Extent2D::default())), 3);
}

#[test]
fn test_image_count_uncapped_when_max_is_zero() {
    assert_eq!(choose_image_count(&capabilities(4, 0, vk::Extent2D::default())), 5);
}

#[test]
fn test_format_prefers_srgb() {
    let formats = [
        vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        },
        vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        },
    ];
    assert_eq!(choose_format(&formats).map(|f| f.format), Some(vk::Format::B8G8R8A8_SRGB));
}

#[test]
fn test_format_falls_back_to_first() {
    let formats = [vk::SurfaceFormatKHR {
        format: vk::Format::A2B10G10R10_UNORM_PACK32,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }];
    assert_eq!(
        choose_format(&formats).map(|f| f.format),
        Some(vk::Format::A2B10G10R10_UNORM_PACK32)
    );
    assert!(choose_format(&[]).is_none());
}
