//! # Standard Error Codes (Errno)
//!
//! Códigos de erro devolvidos pela camada de ioctl do GEM.
//! Segue a numeração POSIX/Linux; retornos de ioctl usam o valor negado
//! (`as_isize`).

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    Success = 0,
    EPERM = 1,   // Operation not permitted
    ENOENT = 2,  // No such file or directory
    EIO = 5,     // I/O error
    EBADF = 9,   // Bad file number
    ENOMEM = 12, // Out of memory
    EFAULT = 14, // Bad address
    EBUSY = 16,  // Device or resource busy
    EEXIST = 17, // File exists
    ENODEV = 19, // No such device
    EINVAL = 22, // Invalid argument
    ENOSPC = 28, // No space left on device
}

impl Errno {
    pub fn as_usize(self) -> usize {
        self as usize
    }

    pub fn as_isize(self) -> isize {
        -(self as i32) as isize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::EPERM => "Operation not permitted",
            Self::ENOENT => "No such file or directory",
            Self::EIO => "I/O error",
            Self::EBADF => "Bad file number",
            Self::ENOMEM => "Out of memory",
            Self::EFAULT => "Bad address",
            Self::EBUSY => "Device or resource busy",
            Self::EEXIST => "File exists",
            Self::ENODEV => "No such device",
            Self::EINVAL => "Invalid argument",
            Self::ENOSPC => "No space left on device",
        }
    }

    /// Converte um código positivo de volta para `Errno`.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Success,
            1 => Self::EPERM,
            2 => Self::ENOENT,
            5 => Self::EIO,
            9 => Self::EBADF,
            12 => Self::ENOMEM,
            14 => Self::EFAULT,
            16 => Self::EBUSY,
            17 => Self::EEXIST,
            19 => Self::ENODEV,
            22 => Self::EINVAL,
            28 => Self::ENOSPC,
            _ => return None,
        })
    }
}

impl core::fmt::Display for Errno {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
