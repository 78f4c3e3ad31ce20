/// Config - Vulkan device bootstrap options

/// Which validation messages reach the debug messenger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Options for `VulkanDevice::new`
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version (`vk::make_api_version` encoding)
    pub app_version: u32,
    /// Enable VK_LAYER_KHRONOS_validation
    ///
    /// Only honored when the crate is built with the `vulkan-validation`
    /// feature.
    pub enable_validation: bool,
    /// Severity filter for validation messages
    pub debug_severity: DebugSeverity,
    /// Panic on the first validation error
    pub panic_on_validation_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Cobalt Application".to_string(),
            app_version: ash::vk::make_api_version(0, 1, 0, 0),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            panic_on_validation_error: false,
        }
    }
}
