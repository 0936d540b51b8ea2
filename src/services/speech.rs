//! 发音服务 - 业务能力层
//!
//! 练习流程只调用 `speak`，不等待结果；失败只记日志
//!
//! 播放方式：配置了 `AUDIO_PLAYER` 时交给外部播放器，否则在启用
//! `playback` feature 时用 rodio 在进程内播放

use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::config::Config;

/// 发音能力
pub trait Speaker: Send + Sync {
    /// 朗读一段文本，立即返回
    fn speak(&self, text: &str);
}

/// 不发声，只记录日志
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&self, text: &str) {
        debug!("🔇 发音已关闭: {}", text);
    }
}

/// 使用在线词典音频（默认有道美音）
///
/// 下载到缓存目录后播放
#[derive(Debug, Clone)]
pub struct DictVoiceSpeaker {
    http: reqwest::Client,
    url_template: String,
    cache_dir: PathBuf,
    player: Option<String>,
}

impl DictVoiceSpeaker {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            url_template: config.audio_url_template.clone(),
            cache_dir: PathBuf::from(&config.audio_cache_dir),
            player: config.audio_player.clone(),
        }
    }

    /// 生成音频地址，`{text}` 所在的查询参数会被正确编码
    pub fn audio_url(&self, text: &str) -> Option<Url> {
        build_audio_url(&self.url_template, text)
    }

    async fn fetch_and_play(self, text: String) {
        let Some(url) = self.audio_url(&text) else {
            warn!("发音地址模板不合法: {}", self.url_template);
            return;
        };

        let path = self.cache_dir.join(cache_file_name(&text));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            if let Err(e) = self.download(&url, &path).await {
                warn!("获取发音失败 ({}): {}", text, e);
                return;
            }
        }

        match self.play(&path).await {
            Ok(()) => debug!("🔊 播放发音: {}", text),
            Err(e) => warn!("播放发音失败 ({}): {}", text, e),
        }
    }

    async fn download(&self, url: &Url, path: &Path) -> anyhow::Result<()> {
        let response = self.http.get(url.clone()).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        write_atomically(&self.cache_dir, path, &bytes).await?;
        debug!("已缓存发音: {}", path.display());
        Ok(())
    }

    async fn play(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(player) = &self.player {
            let status = tokio::process::Command::new(player)
                .arg(path)
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
                .await?;
            anyhow::ensure!(status.success(), "播放器 {} 退出异常: {}", player, status);
            return Ok(());
        }

        play_default(path).await
    }
}

#[cfg(feature = "playback")]
async fn play_default(path: &Path) -> anyhow::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || play_in_process(&path)).await?
}

#[cfg(not(feature = "playback"))]
async fn play_default(_path: &Path) -> anyhow::Result<()> {
    anyhow::bail!("未配置播放器")
}

/// 用默认输出设备播放音频文件，阻塞到播放结束
#[cfg(feature = "playback")]
fn play_in_process(path: &Path) -> anyhow::Result<()> {
    use rodio::{Decoder, OutputStream, Sink};
    use std::io::BufReader;

    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;
    let file = std::fs::File::open(path)?;
    sink.append(Decoder::new(BufReader::new(file))?);
    sink.sleep_until_end();
    Ok(())
}

/// 先写临时文件再改名，中断或并发下载不会留下不完整的缓存
async fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    static NEXT_TMP: AtomicU64 = AtomicU64::new(0);

    tokio::fs::create_dir_all(dir).await?;
    let tmp = dir.join(format!(
        ".{}.{}.part",
        std::process::id(),
        NEXT_TMP.fetch_add(1, Ordering::Relaxed)
    ));

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    tokio::fs::rename(&tmp, path).await
}

impl Speaker for DictVoiceSpeaker {
    fn speak(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.clone().fetch_and_play(text.to_string()));
            }
            Err(_) => warn!("没有运行中的异步运行时，跳过发音: {}", text),
        }
    }
}

/// 当前配置下能否真正播放声音
pub fn playback_available(config: &Config) -> bool {
    config.audio_enabled && (config.audio_player.is_some() || cfg!(feature = "playback"))
}

/// 根据配置选择发音实现
///
/// 没有任何播放方式时不下载音频
pub fn speaker_from_config(config: &Config) -> std::sync::Arc<dyn Speaker> {
    if playback_available(config) {
        std::sync::Arc::new(DictVoiceSpeaker::new(config))
    } else {
        if config.audio_enabled {
            info!("🔇 未配置 AUDIO_PLAYER，发音已关闭");
        }
        std::sync::Arc::new(SilentSpeaker)
    }
}

const TEXT_PLACEHOLDER: &str = "{text}";

fn build_audio_url(template: &str, text: &str) -> Option<Url> {
    let mut url = Url::parse(template).ok()?;

    let mut replaced = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if v == TEXT_PLACEHOLDER {
                replaced = true;
                text.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    if !replaced {
        return None;
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
    Some(url)
}

/// 缓存文件名，只保留字母数字
fn cache_file_name(text: &str) -> String {
    let stem: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}.mp3", stem)
}
