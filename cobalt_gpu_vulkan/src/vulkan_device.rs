/// VulkanDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Bootstraps instance, surface, physical device, logical device and memory
/// allocator, then hands out fences, semaphores and command allocators that
/// all share one `VulkanContext`.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use cobalt_gpu::cobalt::{Error, Resource, Result};
use cobalt_gpu::cobalt::device::{CommandAllocator, Fence, GraphicsDevice, Queue, Semaphore};
use cobalt_gpu::{engine_debug, engine_error, engine_info, engine_warn};

use crate::vulkan_command::VulkanCommandAllocator;
use crate::vulkan_config::Config;
use crate::vulkan_context::VulkanContext;
use crate::vulkan_convert::{vk_error, vk_init_error};
use crate::vulkan_queue::VulkanQueue;
use crate::vulkan_sync::{VulkanFence, VulkanSemaphore};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan graphics device
///
/// Owns the shared context through an `Arc`; objects created from the device
/// keep the context alive after the device itself is dropped.
pub struct VulkanDevice {
    ctx: Arc<VulkanContext>,
    queue: VulkanQueue,
}

/// Physical device that passed every requirement check
struct DeviceCandidate {
    physical_device: vk::PhysicalDevice,
    queue_family: u32,
    rank: u32,
    name: String,
}

impl VulkanDevice {
    /// Create a Vulkan 1.3 device presenting to `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window the surface is created for
    /// * `config` - Bootstrap options
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` if the loader, instance, surface or
    /// device cannot be created, or no GPU supports Vulkan 1.3 with dynamic
    /// rendering and synchronization2.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: Config) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!("cobalt::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let display_handle = window.display_handle().map_err(|e| {
                engine_error!("cobalt::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let window_handle = window.window_handle().map_err(|e| {
                engine_error!("cobalt::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;

            let validation = validation_requested(&config) && validation_layer_available(&entry);
            let instance = create_instance(&entry, &config, display_handle.as_raw(), validation)?;

            #[cfg(feature = "vulkan-validation")]
            let debug_messenger = if validation {
                match crate::debug::DebugMessenger::new(
                    &entry,
                    &instance,
                    config.debug_severity,
                    config.panic_on_validation_error,
                ) {
                    Ok(messenger) => Some(messenger),
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                }
            } else {
                None
            };

            // Everything past this point destroys the instance on failure
            let fail = |error: Error| -> Error {
                #[cfg(feature = "vulkan-validation")]
                if let Some(messenger) = &debug_messenger {
                    messenger.destroy();
                }
                instance.destroy_instance(None);
                error
            };

            let surface = match ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            ) {
                Ok(surface) => surface,
                Err(e) => return Err(fail(vk_init_error(e, "create surface"))),
            };
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let candidate = match select_physical_device(&instance, &surface_loader, surface) {
                Ok(candidate) => candidate,
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    return Err(fail(e));
                }
            };
            engine_info!(
                "cobalt::vulkan",
                "Using GPU '{}' (queue family {})",
                candidate.name,
                candidate.queue_family
            );

            let device = match create_logical_device(&instance, &candidate) {
                Ok(device) => device,
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    return Err(fail(e));
                }
            };

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device: candidate.physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    engine_error!("cobalt::vulkan", "Failed to create GPU allocator: {:?}", e);
                    device.destroy_device(None);
                    surface_loader.destroy_surface(surface, None);
                    return Err(fail(Error::InitializationFailed(format!(
                        "Failed to create allocator: {:?}",
                        e
                    ))));
                }
            };

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);
            let raw_queue = device.get_device_queue(candidate.queue_family, 0);

            let ctx = Arc::new(VulkanContext {
                _entry: entry,
                instance,
                physical_device: candidate.physical_device,
                device,
                allocator: ManuallyDrop::new(Mutex::new(allocator)),
                graphics_queue_family: candidate.queue_family,
                surface,
                surface_loader,
                swapchain_loader,
                #[cfg(feature = "vulkan-validation")]
                debug_messenger,
            });

            engine_info!(
                "cobalt::vulkan",
                "Vulkan device created (validation: {})",
                if validation { "on" } else { "off" }
            );

            Ok(Self {
                queue: VulkanQueue::new(Arc::clone(&ctx), raw_queue),
                ctx,
            })
        }
    }

    /// Shared native context, for objects created on this device
    pub(crate) fn context(&self) -> Arc<VulkanContext> {
        Arc::clone(&self.ctx)
    }

    pub fn raw(&self) -> &ash::Device {
        &self.ctx.device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.ctx.physical_device
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.ctx.graphics_queue_family
    }
}

impl GraphicsDevice for VulkanDevice {
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        Ok(Box::new(VulkanFence::new(self.context(), signaled)?))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        Ok(Box::new(VulkanSemaphore::new(self.context())?))
    }

    fn create_command_allocator(&self) -> Result<Box<dyn CommandAllocator>> {
        Ok(Box::new(VulkanCommandAllocator::new(self.context())?))
    }

    fn graphics_queue(&self) -> &dyn Queue {
        &self.queue
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| vk_error(e, "wait idle"))
        }
    }
}

impl Resource for VulkanDevice {}

// ===== BOOTSTRAP =====

/// Validation is compiled in only with the `vulkan-validation` feature
fn validation_requested(config: &Config) -> bool {
    let compiled = cfg!(feature = "vulkan-validation");
    if config.enable_validation && !compiled {
        engine_warn!(
            "cobalt::vulkan",
            "Validation requested but the vulkan-validation feature is disabled"
        );
    }
    config.enable_validation && compiled
}

unsafe fn validation_layer_available(entry: &ash::Entry) -> bool {
    let available = entry
        .enumerate_instance_layer_properties()
        .map(|layers| {
            layers
                .iter()
                .any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER))
        })
        .unwrap_or(false);
    if !available {
        engine_warn!("cobalt::vulkan", "VK_LAYER_KHRONOS_validation not installed, validation disabled");
    }
    available
}

unsafe fn create_instance(
    entry: &ash::Entry,
    config: &Config,
    display: raw_window_handle::RawDisplayHandle,
    validation: bool,
) -> Result<ash::Instance> {
    let app_name = CString::new(config.app_name.as_str()).map_err(|_| {
        Error::InitializationFailed("Application name contains a NUL byte".to_string())
    })?;

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(config.app_version)
        .engine_name(c"Cobalt")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_3);

    let mut extension_names = ash_window::enumerate_required_extensions(display)
        .map_err(|e| vk_init_error(e, "get required extensions"))?
        .to_vec();
    if validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
    }

    let layer_names = if validation {
        vec![VALIDATION_LAYER.as_ptr()]
    } else {
        vec![]
    };

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_layer_names(&layer_names)
        .enabled_extension_names(&extension_names);

    entry
        .create_instance(&create_info, None)
        .map_err(|e| vk_init_error(e, "create instance"))
}

/// Pick the best GPU that supports everything the backend needs
unsafe fn select_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<DeviceCandidate> {
    let physical_devices = instance
        .enumerate_physical_devices()
        .map_err(|e| vk_init_error(e, "enumerate physical devices"))?;

    let mut best: Option<DeviceCandidate> = None;
    for physical_device in physical_devices {
        let properties = instance.get_physical_device_properties(physical_device);
        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        if !meets_api_version(properties.api_version) {
            engine_debug!("cobalt::vulkan", "Skipping '{}': Vulkan 1.3 not supported", name);
            continue;
        }
        if !supports_required_features(instance, physical_device) {
            engine_debug!(
                "cobalt::vulkan",
                "Skipping '{}': dynamic rendering or synchronization2 missing",
                name
            );
            continue;
        }
        if !supports_swapchain(instance, physical_device) {
            engine_debug!("cobalt::vulkan", "Skipping '{}': no swapchain extension", name);
            continue;
        }

        let queue_family = instance
            .get_physical_device_queue_family_properties(physical_device)
            .iter()
            .enumerate()
            .find(|(index, family)| {
                family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                    && surface_loader
                        .get_physical_device_surface_support(physical_device, *index as u32, surface)
                        .unwrap_or(false)
            })
            .map(|(index, _)| index as u32);
        let queue_family = match queue_family {
            Some(index) => index,
            None => {
                engine_debug!("cobalt::vulkan", "Skipping '{}': no graphics queue can present", name);
                continue;
            }
        };

        let rank = device_type_rank(properties.device_type);
        if best.as_ref().map_or(true, |b| rank > b.rank) {
            best = Some(DeviceCandidate { physical_device, queue_family, rank, name });
        }
    }

    best.ok_or_else(|| {
        engine_error!("cobalt::vulkan", "No GPU supports Vulkan 1.3 with dynamic rendering and presentation");
        Error::InitializationFailed("No suitable GPU found".to_string())
    })
}

unsafe fn supports_required_features(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> bool {
    let mut features13 = vk::PhysicalDeviceVulkan13Features::default();
    let mut features2 = vk::PhysicalDeviceFeatures2::default().push_next(&mut features13);
    instance.get_physical_device_features2(physical_device, &mut features2);
    features13.dynamic_rendering == vk::TRUE && features13.synchronization2 == vk::TRUE
}

unsafe fn supports_swapchain(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> bool {
    instance
        .enumerate_device_extension_properties(physical_device)
        .map(|extensions| {
            extensions.iter().any(|ext| {
                ext.extension_name_as_c_str()
                    .is_ok_and(|name| name == ash::khr::swapchain::NAME)
            })
        })
        .unwrap_or(false)
}

unsafe fn create_logical_device(instance: &ash::Instance, candidate: &DeviceCandidate) -> Result<ash::Device> {
    let queue_priorities = [1.0];
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(candidate.queue_family)
        .queue_priorities(&queue_priorities)];

    let extension_names = [ash::khr::swapchain::NAME.as_ptr()];

    let mut features13 = vk::PhysicalDeviceVulkan13Features::default()
        .dynamic_rendering(true)
        .synchronization2(true);

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .push_next(&mut features13);

    instance
        .create_device(candidate.physical_device, &create_info, None)
        .map_err(|e| vk_init_error(e, "create logical device"))
}

/// Preference order when several GPUs qualify
pub(crate) fn device_type_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 4,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 3,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 1,
        _ => 0,
    }
}

pub(crate) fn meets_api_version(api_version: u32) -> bool {
    let major = vk::api_version_major(api_version);
    let minor = vk::api_version_minor(api_version);
    major > 1 || (major == 1 && minor >= 3)
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
