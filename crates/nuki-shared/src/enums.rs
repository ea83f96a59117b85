//! Byte-coded vocabularies used by the keyturner protocol.
//!
//! Every enum keeps unknown wire values in an explicit `Other(n)` variant so
//! a firmware that reports something new never fails a whole decode.

use serde::{Deserialize, Serialize};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $repr:ty {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr => $label:expr, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value this bridge does not know about.
            Other($repr),
        }

        impl $name {
            pub fn from_raw(raw: $repr) -> Self {
                match raw {
                    $( $value => Self::$variant, )+
                    other => Self::Other(other),
                }
            }

            pub fn raw(self) -> $repr {
                match self {
                    $( Self::$variant => $value, )+
                    Self::Other(other) => other,
                }
            }

            /// Human readable name, as used in callback payloads.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                    Self::Other(_) => "Unknown",
                }
            }
        }

        impl From<$repr> for $name {
            fn from(raw: $repr) -> Self {
                Self::from_raw(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    Self::Other(raw) => write!(f, "{}({:#x})", stringify!($name), raw),
                    known => f.write_str(known.name()),
                }
            }
        }
    };
}

wire_enum! {
    /// Command identifiers of the unencrypted and encrypted frames.
    pub enum Command: u16 {
        RequestData = 0x0001 => "RequestData",
        PublicKey = 0x0003 => "PublicKey",
        Challenge = 0x0004 => "Challenge",
        AuthorizationAuthenticator = 0x0005 => "AuthorizationAuthenticator",
        AuthorizationData = 0x0006 => "AuthorizationData",
        AuthorizationId = 0x0007 => "AuthorizationID",
        RemoveUserAuthorization = 0x0008 => "RemoveUserAuthorization",
        RequestAuthorizationEntries = 0x0009 => "RequestAuthorizationEntries",
        KeyturnerStates = 0x000C => "KeyturnerStates",
        LockAction = 0x000D => "LockAction",
        Status = 0x000E => "Status",
        ErrorReport = 0x0012 => "ErrorReport",
        RequestConfig = 0x0014 => "RequestConfig",
        Config = 0x0015 => "Config",
        AuthorizationIdConfirmation = 0x001E => "AuthorizationIDConfirmation",
        RequestLogEntries = 0x0031 => "RequestLogEntries",
        LogEntry = 0x0032 => "LogEntry",
    }
}

wire_enum! {
    /// Payload of a `Status` frame.
    pub enum StatusCode: u8 {
        Complete = 0x00 => "Complete",
        Accepted = 0x01 => "Accepted",
    }
}

wire_enum! {
    /// Error codes carried by `ErrorReport` frames.
    pub enum ErrorCode: u8 {
        NotPairing = 0x10 => "NotPairing",
        BadAuthenticator = 0x11 => "BadAuthenticator",
        PairingBadParameter = 0x12 => "PairingBadParameter",
        MaxUser = 0x13 => "MaxUser",
        NotAuthorized = 0x20 => "NotAuthorized",
        BadPin = 0x21 => "BadPin",
        BadNonce = 0x22 => "BadNonce",
        BadParameter = 0x23 => "BadParameter",
        InvalidAuthId = 0x24 => "InvalidAuthId",
        Disabled = 0x25 => "Disabled",
        RemoteNotAllowed = 0x26 => "RemoteNotAllowed",
        TimeNotAllowed = 0x27 => "TimeNotAllowed",
        TooManyPinAttempts = 0x28 => "TooManyPinAttempts",
        AutoUnlockTooRecent = 0x40 => "AutoUnlockTooRecent",
        PositionUnknown = 0x41 => "PositionUnknown",
        MotorBlocked = 0x42 => "MotorBlocked",
        ClutchFailure = 0x43 => "ClutchFailure",
        MotorTimeout = 0x44 => "MotorTimeout",
        Busy = 0x45 => "Busy",
        Canceled = 0x46 => "Canceled",
        NotCalibrated = 0x47 => "NotCalibrated",
        MotorPositionLimit = 0x48 => "MotorPositionLimit",
        MotorLowVoltage = 0x49 => "MotorLowVoltage",
        MotorPowerFailure = 0x4A => "MotorPowerFailure",
        ClutchPowerFailure = 0x4B => "ClutchPowerFailure",
        VoltageTooLow = 0x4C => "VoltageTooLow",
        FirmwareUpdateNeeded = 0x4D => "FirmwareUpdateNeeded",
        BadCrc = 0xFD => "BadCrc",
        BadLength = 0xFE => "BadLength",
        Unknown = 0xFF => "Unknown",
    }
}

wire_enum! {
    /// Operating mode of the keyturner.
    pub enum NukiState: u8 {
        Uninitialized = 0x00 => "Uninitialized",
        PairingMode = 0x01 => "PairingMode",
        DoorMode = 0x02 => "DoorMode",
        MaintenanceMode = 0x04 => "MaintenanceMode",
    }
}

wire_enum! {
    /// Position state of the lock.
    pub enum LockState: u8 {
        Uncalibrated = 0x00 => "Uncalibrated",
        Locked = 0x01 => "Locked",
        Unlocking = 0x02 => "Unlocking",
        Unlocked = 0x03 => "Unlocked",
        Locking = 0x04 => "Locking",
        Unlatched = 0x05 => "Unlatched",
        LocknGoActive = 0x06 => "LocknGoActive",
        Unlatching = 0x07 => "Unlatching",
        Calibration = 0xFC => "Calibration",
        BootRun = 0xFD => "BootRun",
        MotorBlocked = 0xFE => "MotorBlocked",
        Undefined = 0xFF => "Undefined",
    }
}

wire_enum! {
    pub enum LockAction: u8 {
        Unlock = 0x01 => "Unlock",
        Lock = 0x02 => "Lock",
        Unlatch = 0x03 => "Unlatch",
        LocknGo = 0x04 => "LocknGo",
        LocknGoUnlatch = 0x05 => "LocknGoUnlatch",
        FullLock = 0x06 => "FullLock",
        FobAction1 = 0x81 => "FobAction1",
        FobAction2 = 0x82 => "FobAction2",
        FobAction3 = 0x83 => "FobAction3",
    }
}

wire_enum! {
    /// What caused a state change.
    pub enum Trigger: u8 {
        System = 0x00 => "System",
        Manual = 0x01 => "Manual",
        Button = 0x02 => "Button",
        Automatic = 0x03 => "Automatic",
        AutoLock = 0x06 => "AutoLock",
    }
}

wire_enum! {
    pub enum CompletionStatus: u8 {
        Success = 0x00 => "Success",
        MotorBlocked = 0x01 => "MotorBlocked",
        Canceled = 0x02 => "Canceled",
        TooRecent = 0x03 => "TooRecent",
        Busy = 0x04 => "Busy",
        LowMotorVoltage = 0x05 => "LowMotorVoltage",
        ClutchFailure = 0x06 => "ClutchFailure",
        MotorPowerFailure = 0x07 => "MotorPowerFailure",
        IncompleteFailure = 0x08 => "IncompleteFailure",
        OtherError = 0xFE => "OtherError",
        Unknown = 0xFF => "Unknown",
    }
}

wire_enum! {
    /// Door sensor state as reported in the keyturner state.
    pub enum DoorSensorState: u8 {
        Unavailable = 0x00 => "Unavailable",
        Deactivated = 0x01 => "Deactivated",
        DoorClosed = 0x02 => "DoorClosed",
        DoorOpened = 0x03 => "DoorOpened",
        DoorStateUnknown = 0x04 => "DoorStateUnknown",
        Calibrating = 0x05 => "Calibrating",
    }
}

wire_enum! {
    /// Door sensor event as recorded in the log.
    pub enum DoorSensorEvent: u8 {
        DoorOpened = 0x00 => "DoorOpened",
        DoorClosed = 0x01 => "DoorClosed",
        SensorJammed = 0x02 => "SensorJammed",
    }
}

wire_enum! {
    pub enum KeypadActionSource: u8 {
        ArrowKey = 0x00 => "ArrowKey",
        Code = 0x01 => "Code",
    }
}

wire_enum! {
    pub enum LogType: u8 {
        Logging = 0x01 => "Logging",
        LockAction = 0x02 => "LockAction",
        Calibration = 0x03 => "Calibration",
        InitializationRun = 0x04 => "InitializationRun",
        KeypadAction = 0x05 => "KeypadAction",
        DoorSensor = 0x06 => "DoorSensor",
        DoorSensorLogging = 0x07 => "DoorSensorLogging",
    }
}

wire_enum! {
    pub enum SortOrder: u8 {
        Ascending = 0x00 => "Ascending",
        Descending = 0x01 => "Descending",
    }
}
