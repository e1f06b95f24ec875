//! Operator-facing message catalog.

/// Language for log messages shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Zh,
}

impl Lang {
    /// Map a configuration value (`en`, `zh`, `zh-CN`, ...) to a language.
    pub fn from_code(code: &str) -> Self {
        if code.trim().to_ascii_lowercase().starts_with("zh") {
            Lang::Zh
        } else {
            Lang::En
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Zh => "zh",
        }
    }
}

/// Messages logged by the lifecycle layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    InvalidListenAddress,
    InvalidCustomDns,
    ConfigUnreadable,
    ConfigNotFoundForReset,
    PasswordReset,
    PasswordResetFailed,
    SkipVerifyEnabled,
    Listening,
    BindFailed,
    WebServiceFailed,
    DockerHint,
    WaitingForNetwork,
    NetworkConnected,
}

/// Text of `msg` in `lang`.
pub fn tr(lang: Lang, msg: Message) -> &'static str {
    use Message::*;
    match (lang, msg) {
        (Lang::En, InvalidListenAddress) => "Parse listen address failed",
        (Lang::Zh, InvalidListenAddress) => "解析监听地址失败",
        (Lang::En, InvalidCustomDns) => "Invalid custom DNS server address",
        (Lang::Zh, InvalidCustomDns) => "自定义 DNS 服务器地址无效",
        (Lang::En, ConfigUnreadable) => "Failed to read config file",
        (Lang::Zh, ConfigUnreadable) => "读取配置文件失败",
        (Lang::En, ConfigNotFoundForReset) => {
            "Config file not found, specify its path with -c"
        }
        (Lang::Zh, ConfigNotFoundForReset) => "配置文件不存在, 可通过 -c 指定配置文件",
        (Lang::En, PasswordReset) => "Password has been reset",
        (Lang::Zh, PasswordReset) => "密码重置成功",
        (Lang::En, PasswordResetFailed) => "Failed to reset password",
        (Lang::Zh, PasswordResetFailed) => "密码重置失败",
        (Lang::En, SkipVerifyEnabled) => "TLS certificate verification is disabled",
        (Lang::Zh, SkipVerifyEnabled) => "已跳过证书验证",
        (Lang::En, Listening) => "Listening",
        (Lang::Zh, Listening) => "监听",
        (Lang::En, BindFailed) => {
            "Failed to listen on port, check whether the port is already in use"
        }
        (Lang::Zh, BindFailed) => "监听端口发生异常, 请检查端口是否被占用",
        (Lang::En, WebServiceFailed) => "Web service failed, the process will exit",
        (Lang::Zh, WebServiceFailed) => "Web 服务异常, 进程即将退出",
        (Lang::En, DockerHint) => {
            "Running in Docker, open http://<docker host ip>:<port> in a browser to configure"
        }
        (Lang::Zh, DockerHint) => "Docker中运行, 请在浏览器中打开 http://docker主机IP:端口 进行配置",
        (Lang::En, WaitingForNetwork) => "Waiting for network connection",
        (Lang::Zh, WaitingForNetwork) => "等待网络连接",
        (Lang::En, NetworkConnected) => "Network connected",
        (Lang::Zh, NetworkConnected) => "网络已连接",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Lang::from_code("zh"), Lang::Zh);
        assert_eq!(Lang::from_code("zh-CN"), Lang::Zh);
        assert_eq!(Lang::from_code("en"), Lang::En);
        assert_eq!(Lang::from_code(""), Lang::En);
        assert_eq!(Lang::from_code("fr"), Lang::En);
    }

    #[test]
    fn test_catalog_differs_per_language() {
        assert_ne!(
            tr(Lang::En, Message::NetworkConnected),
            tr(Lang::Zh, Message::NetworkConnected)
        );
    }
}
